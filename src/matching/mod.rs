// src/matching/mod.rs
pub mod matcher;
pub mod normalize;
pub mod similarity;

// Re-export main matching functions for clean API
pub use matcher::{best_match, EntityMatcher, MatchDecision, ScoringPass};
pub use normalize::{normalize, slugify, tokens};
pub use similarity::{
    edit_distance_ratio, token_overlap_score, EditDistanceRatio, SimilarityScorer, TokenOverlap,
};
