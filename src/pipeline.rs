// src/pipeline.rs
//! Runs the merge over all source batches in ingestion order, then links
//! players to clubs.

use indicatif::MultiProgress;
use log::{info, warn};

use crate::enrichment::club_link::link_players_to_clubs;
use crate::entity_identification::aliases::AliasRegistry;
use crate::entity_identification::merge::MergeEngine;
use crate::entity_identification::store::CanonicalRecordStore;
use crate::matching::matcher::EntityMatcher;
use crate::models::core::{EntityKind, SourceKind};
use crate::models::stats_models::{BatchStats, LinkStats};
use crate::sources::SourceBatch;
use crate::utils::get_memory_usage;
use crate::utils::progress_bars::logging::MergeLogger;
use crate::utils::progress_bars::progress_config::{
    add_bar, main_bar_style, sub_bar_style, ProgressConfig,
};

pub struct MergeOutcome {
    pub players: CanonicalRecordStore,
    pub clubs: CanonicalRecordStore,
    pub batches: Vec<BatchStats>,
    pub links: LinkStats,
}

/// Thresholds for the matcher of each store; both stores use the same ones.
#[derive(Debug, Clone, Copy)]
pub struct MatchThresholds {
    pub token: f64,
    pub edit: f64,
}

impl MatchThresholds {
    fn matcher(&self) -> EntityMatcher {
        EntityMatcher::new(self.token, self.edit)
    }
}

pub fn run_merge(
    batches: &[SourceBatch],
    aliases: &AliasRegistry,
    thresholds: MatchThresholds,
    progress: &ProgressConfig,
    multi: Option<&MultiProgress>,
) -> MergeOutcome {
    let mut players = MergeEngine::new(
        CanonicalRecordStore::new(EntityKind::Player, thresholds.matcher()),
        aliases.clone(),
    );
    let mut clubs = MergeEngine::new(
        CanonicalRecordStore::new(EntityKind::Club, thresholds.matcher()),
        aliases.clone(),
    );
    let player_log = MergeLogger::new(EntityKind::Player);
    let club_log = MergeLogger::new(EntityKind::Club);

    for batch in batches.iter().filter(|b| b.kind == SourceKind::Unknown) {
        warn!("Ignoring batch '{}' of unknown kind ({} rows)", batch.tag, batch.len());
    }

    let ordered: Vec<&SourceBatch> = SourceKind::INGEST_ORDER
        .iter()
        .flat_map(|kind| batches.iter().filter(move |b| b.kind == *kind))
        .collect();

    let rows_of = |kind: EntityKind| -> usize {
        ordered
            .iter()
            .filter(|b| b.kind.entity_kind() == Some(kind))
            .map(|b| b.len())
            .sum()
    };
    let count_of = |kind: EntityKind| ordered.iter().filter(|b| b.kind.entity_kind() == Some(kind)).count();
    player_log.log_start(count_of(EntityKind::Player), rows_of(EntityKind::Player));
    club_log.log_start(count_of(EntityKind::Club), rows_of(EntityKind::Club));

    player_log.log_debug(&format!(
        "ingestion order: {}",
        ordered.iter().map(|b| b.tag.as_str()).collect::<Vec<_>>().join(", ")
    ));

    let main_pb = add_bar(multi, ordered.len() as u64 + 1, main_bar_style(), "Merging sources...");
    let mut batch_stats = Vec::with_capacity(ordered.len());

    for batch in ordered {
        let Some(kind) = batch.kind.entity_kind() else {
            continue;
        };
        let (engine, logger) = match kind {
            EntityKind::Player => (&mut players, &player_log),
            EntityKind::Club => (&mut clubs, &club_log),
        };

        if let Some(pb) = &main_pb {
            pb.set_message(format!("Merging {} ({} rows)", batch.tag, batch.len()));
        }
        logger.log_phase(
            &format!("ingest {}", batch.tag),
            Some(format!("{} rows", batch.len()).as_str()),
        );

        let sub_pb = if progress.should_show_detailed() {
            add_bar(multi, batch.len() as u64, sub_bar_style(), batch.tag.clone())
        } else {
            None
        };
        let stats = engine.ingest_batch(&batch.rows, &batch.tag, sub_pb.as_ref());
        if let Some(pb) = sub_pb {
            pb.finish_with_message(format!("{}: {} rows merged", batch.tag, stats.rows));
        }
        logger.log_batch(&stats);
        batch_stats.push(stats);

        if let Some(pb) = &main_pb {
            pb.inc(1);
        }
    }

    player_log.log_completion(players.store().len(), players.store().indexed_names());
    club_log.log_completion(clubs.store().len(), clubs.store().indexed_names());

    if let Some(pb) = &main_pb {
        pb.set_message("Linking players to clubs...");
    }
    let mut player_store = players.into_store();
    let club_store = clubs.into_store();
    let links = if club_store.is_empty() {
        player_log.log_warning("No clubs merged; skipping club linking");
        LinkStats::default()
    } else {
        let links = link_players_to_clubs(&mut player_store, &club_store);
        player_log.log_links(&links);
        links
    };

    if let Some(pb) = &main_pb {
        pb.inc(1);
        if progress.should_show_memory() {
            pb.finish_with_message(format!("Merge complete (Memory: {} MB)", get_memory_usage()));
        } else {
            pb.finish_with_message("Merge complete");
        }
    }
    info!(
        "✅ Merged {} players and {} clubs from {} batches",
        player_store.len(),
        club_store.len(),
        batch_stats.len()
    );

    MergeOutcome {
        players: player_store,
        clubs: club_store,
        batches: batch_stats,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::{Field, RawRow};

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().copied().collect()
    }

    fn batch(kind: SourceKind, rows: Vec<RawRow>) -> SourceBatch {
        let mut batch = SourceBatch::new(kind);
        batch.rows = rows;
        batch
    }

    fn quiet() -> ProgressConfig {
        ProgressConfig {
            enabled: false,
            detailed: false,
            show_memory: false,
        }
    }

    fn thresholds() -> MatchThresholds {
        MatchThresholds { token: 0.6, edit: 0.78 }
    }

    #[test]
    fn test_ingestion_follows_source_order() {
        // injuries listed first still resolve against the players batch
        let batches = vec![
            batch(
                SourceKind::Injuries,
                vec![row(&[("player_name", "Pedri"), ("injury_reason", "Knee")])],
            ),
            batch(
                SourceKind::Competitions,
                vec![row(&[
                    ("club_id", "131"),
                    ("competition_id", "ES1"),
                    ("competition_name", "LaLiga"),
                ])],
            ),
            batch(
                SourceKind::Teams,
                vec![row(&[("club_id", "131"), ("club_name", "FC Barcelona"), ("country_name", "Spain")])],
            ),
            batch(
                SourceKind::Players,
                vec![row(&[("player_id", "342229"), ("player_name", "Pedri"), ("club", "Barcelona FC")])],
            ),
        ];

        let outcome = run_merge(&batches, &AliasRegistry::default(), thresholds(), &quiet(), None);

        let tags: Vec<&str> = outcome.batches.iter().map(|s| s.source_tag.as_str()).collect();
        assert_eq!(tags, vec!["players", "injuries", "teams", "competitions"]);
        assert_eq!(outcome.players.len(), 1);
        assert_eq!(outcome.clubs.len(), 1);

        let pedri = outcome.players.get("342229").unwrap();
        assert_eq!(pedri.records["injuries"].len(), 1);
        assert_eq!(pedri.links.get("club").map(String::as_str), Some("131"));
        assert_eq!(outcome.links.linked_by_name, 1);

        let barca = outcome.clubs.get("131").unwrap();
        assert_eq!(barca.field_text(Field::Country), Some("Spain"));
        assert_eq!(barca.records["competitions"][0]["competition_name"], "LaLiga");
    }

    #[test]
    fn test_unknown_batches_are_ignored() {
        let batches = vec![batch(SourceKind::Unknown, vec![row(&[("id", "1")])])];
        let outcome = run_merge(&batches, &AliasRegistry::default(), thresholds(), &quiet(), None);
        assert!(outcome.players.is_empty());
        assert!(outcome.clubs.is_empty());
        assert!(outcome.batches.is_empty());
    }
}
