// src/matching/similarity.rs
//! Name similarity scorers used by the matcher cascade.
//!
//! Every scorer maps a pair of names to [0.0, 1.0]. The matcher only talks to
//! the `SimilarityScorer` trait, so a scorer can be replaced (n-gram, phonetic)
//! without touching the cascade.

use std::collections::BTreeSet;

use crate::matching::normalize::normalize;

pub const TOKEN_OVERLAP: &str = "token_overlap";
pub const EDIT_DISTANCE: &str = "edit_distance";

pub trait SimilarityScorer: Send + Sync {
    /// Stable label, used in logs and resolution statistics.
    fn name(&self) -> &'static str;

    /// Scores two names that are already in `normalize` form.
    fn score_normalized(&self, a: &str, b: &str) -> f64;

    fn score(&self, a: &str, b: &str) -> f64 {
        self.score_normalized(&normalize(a), &normalize(b))
    }
}

/// Jaccard overlap of the two token sets. A single-letter token left over
/// after exact matching counts as an initial and pairs with one unmatched
/// word on the other side that starts with the same letter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlap;

impl SimilarityScorer for TokenOverlap {
    fn name(&self) -> &'static str {
        TOKEN_OVERLAP
    }

    fn score_normalized(&self, a: &str, b: &str) -> f64 {
        let left: BTreeSet<&str> = a.split_whitespace().collect();
        let right: BTreeSet<&str> = b.split_whitespace().collect();
        if left.is_empty() && right.is_empty() {
            return 0.0;
        }

        let exact = left.intersection(&right).count();
        let mut left_rest: Vec<&str> = left.difference(&right).copied().collect();
        let mut right_rest: Vec<&str> = right.difference(&left).copied().collect();
        let initials = match_initials(&mut left_rest, &mut right_rest)
            + match_initials(&mut right_rest, &mut left_rest);

        let matched = exact + initials;
        let union = left.len() + right.len() - matched;
        matched as f64 / union as f64
    }
}

fn is_initial(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

/// Pairs initials in `initials` with words in `words`, removing every paired
/// token from both lists. Returns the number of pairs.
fn match_initials(initials: &mut Vec<&str>, words: &mut Vec<&str>) -> usize {
    let mut matched = 0;
    initials.retain(|token| {
        if !is_initial(token) {
            return true;
        }
        let Some(letter) = token.chars().next() else {
            return true;
        };
        match words.iter().position(|w| w.starts_with(letter)) {
            Some(pos) => {
                words.remove(pos);
                matched += 1;
                false
            }
            None => true,
        }
    });
    matched
}

/// `1 - levenshtein / max_len` over the characters of the normalized names.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceRatio;

impl SimilarityScorer for EditDistanceRatio {
    fn name(&self) -> &'static str {
        EDIT_DISTANCE
    }

    fn score_normalized(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        let (len_a, len_b) = (a.chars().count(), b.chars().count());
        if len_a == 0 || len_b == 0 {
            return 0.0;
        }
        let distance = strsim::levenshtein(a, b);
        1.0 - distance as f64 / len_a.max(len_b) as f64
    }
}

/// Token-set overlap of two names. Equals plain Jaccard unless one side has
/// single-letter initials, which pair with words and raise the score above it.
pub fn token_overlap_score(a: &str, b: &str) -> f64 {
    TokenOverlap.score(a, b)
}

pub fn edit_distance_ratio(a: &str, b: &str) -> f64 {
    EditDistanceRatio.score(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_token_overlap_plain_jaccard() {
        assert!(close(token_overlap_score("alpha beta gamma", "alpha beta gamma delta epsilon"), 0.6));
        assert!(close(token_overlap_score("Jon Smith", "John Smith"), 1.0 / 3.0));
        assert!(close(token_overlap_score("Smith John", "john  SMITH"), 1.0));
        assert!(close(token_overlap_score("Paul Pogba", "Kylian Mbappe"), 0.0));
    }

    #[test]
    fn test_token_overlap_empty_is_not_a_match() {
        assert_eq!(token_overlap_score("", ""), 0.0);
        assert_eq!(token_overlap_score("...", "  "), 0.0);
        assert_eq!(token_overlap_score("messi", ""), 0.0);
    }

    #[test]
    fn test_token_overlap_initials() {
        assert!(close(token_overlap_score("L. Messi", "Lionel Messi"), 1.0));
        assert!(close(token_overlap_score("Lionel Messi", "L Messi"), 1.0));
        // the initial is consumed by one word only
        assert!(close(token_overlap_score("J Silva", "Joao Jose Silva"), 2.0 / 3.0));
        // no word with that letter: plain Jaccard
        assert!(close(token_overlap_score("K. Messi", "Lionel Messi"), 1.0 / 3.0));
        // digits are not initials
        assert!(close(token_overlap_score("1 Messi", "10 Messi"), 1.0 / 3.0));
    }

    #[test]
    fn test_edit_distance_ratio() {
        assert!(close(edit_distance_ratio("Jon Smith", "John Smith"), 0.9));
        assert!(edit_distance_ratio("Jon Smith", "Jonathan Smithson") < 0.78);
        assert_eq!(edit_distance_ratio("MESSI", "messi."), 1.0);
        assert_eq!(edit_distance_ratio("", "messi"), 0.0);
        assert_eq!(edit_distance_ratio("messi", "!!"), 0.0);
    }

    #[test]
    fn test_edit_distance_counts_characters_not_bytes() {
        // one substitution over six characters
        assert!(close(edit_distance_ratio("müller", "muller"), 1.0 - 1.0 / 6.0));
    }

    #[test]
    fn test_scorers_are_interchangeable() {
        let scorers: Vec<Box<dyn SimilarityScorer>> =
            vec![Box::new(TokenOverlap), Box::new(EditDistanceRatio)];
        for scorer in &scorers {
            let s = scorer.score("Kevin De Bruyne", "kevin de bruyne");
            assert_eq!(s, 1.0, "{} should score identical names 1.0", scorer.name());
        }
    }
}
