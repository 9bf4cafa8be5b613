// src/matching/matcher.rs
use log::debug;

use crate::matching::normalize::normalize;
use crate::matching::similarity::{EditDistanceRatio, SimilarityScorer, TokenOverlap};

pub const DEFAULT_TOKEN_THRESHOLD: f64 = 0.6;
pub const DEFAULT_EDIT_THRESHOLD: f64 = 0.78;

/// Label of the exact normalized-name pass, which always runs first.
pub const EXACT: &str = "exact";

/// One fuzzy pass of the cascade: a scorer and the minimum score it needs.
pub struct ScoringPass {
    scorer: Box<dyn SimilarityScorer>,
    threshold: f64,
}

impl ScoringPass {
    pub fn new(scorer: impl SimilarityScorer + 'static, threshold: f64) -> Self {
        Self {
            scorer: Box::new(scorer),
            threshold,
        }
    }

    pub fn name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score_normalized(&self, a: &str, b: &str) -> f64 {
        self.scorer.score_normalized(a, b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub entity_id: String,
    /// Pass that decided the match (`exact` or a scorer name).
    pub pass: &'static str,
    pub score: f64,
}

/// Cascade matcher: exact normalized name, then each scoring pass in order.
/// The first pass whose best candidate reaches its threshold wins; scores are
/// never blended across passes.
pub struct EntityMatcher {
    passes: Vec<ScoringPass>,
}

impl Default for EntityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_THRESHOLD, DEFAULT_EDIT_THRESHOLD)
    }
}

impl EntityMatcher {
    pub fn new(token_threshold: f64, edit_threshold: f64) -> Self {
        Self::with_passes(vec![
            ScoringPass::new(TokenOverlap, token_threshold),
            ScoringPass::new(EditDistanceRatio, edit_threshold),
        ])
    }

    pub fn with_passes(passes: Vec<ScoringPass>) -> Self {
        Self { passes }
    }

    pub fn passes(&self) -> &[ScoringPass] {
        &self.passes
    }

    /// Matches a raw query against `(entity_id, canonical_name)` candidates.
    pub fn best_match<'a, I>(&self, query_name: &str, candidates: I) -> Option<MatchDecision>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let normalized: Vec<(&str, String)> = candidates
            .into_iter()
            .map(|(id, name)| (id, normalize(name)))
            .collect();
        self.best_match_normalized(
            &normalize(query_name),
            normalized.iter().map(|(id, name)| (*id, name.as_str())),
        )
    }

    /// Same as `best_match`, for a query and candidate names that are
    /// already normalized.
    pub fn best_match_normalized<'a, I>(
        &self,
        query: &str,
        candidates: I,
    ) -> Option<MatchDecision>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if query.is_empty() {
            return None;
        }
        let candidates: Vec<(&str, &str)> = candidates.into_iter().collect();

        if let Some((id, _)) = candidates.iter().find(|(_, name)| *name == query) {
            debug!("Matcher: '{}' exact match -> {}", query, id);
            return Some(MatchDecision {
                entity_id: id.to_string(),
                pass: EXACT,
                score: 1.0,
            });
        }

        for pass in &self.passes {
            let mut best: Option<(&str, f64)> = None;
            for (id, name) in &candidates {
                let score = pass.score_normalized(query, name);
                if score > best.map_or(0.0, |(_, s)| s) {
                    best = Some((*id, score));
                }
            }

            match best {
                Some((id, score)) if score >= pass.threshold => {
                    debug!(
                        "Matcher: '{}' {} match -> {} (score {:.3} >= {:.2})",
                        query,
                        pass.name(),
                        id,
                        score,
                        pass.threshold
                    );
                    return Some(MatchDecision {
                        entity_id: id.to_string(),
                        pass: pass.name(),
                        score,
                    });
                }
                Some((id, score)) => debug!(
                    "Matcher: '{}' best {} candidate {} scored {:.3} < {:.2}",
                    query,
                    pass.name(),
                    id,
                    score,
                    pass.threshold
                ),
                None => {}
            }
        }
        None
    }
}

/// Cascade with the two standard passes; returns the matching entity id.
pub fn best_match<'a, I>(
    query_name: &str,
    candidates: I,
    token_threshold: f64,
    edit_threshold: f64,
) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    EntityMatcher::new(token_threshold, edit_threshold)
        .best_match(query_name, candidates)
        .map(|decision| decision.entity_id)
}
