pub mod enrichment;
pub mod entity_identification;
pub mod matching;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod utils;
