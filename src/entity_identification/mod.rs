// src/entity_identification/mod.rs
pub mod aliases;
pub mod merge;
pub mod store;

pub use aliases::{AliasRegistry, AliasTable};
pub use merge::{IngestOutcome, MergeEngine};
pub use store::{CanonicalRecordStore, Resolution};
