// src/utils/progress_bars/logging.rs - Logging helpers for merge phases
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::core::EntityKind;
use crate::models::stats_models::{BatchStats, LinkStats};

#[derive(Clone)]
pub struct MergeLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl MergeLogger {
    pub fn new(kind: EntityKind) -> Self {
        let (stage_name, stage_emoji) = match kind {
            EntityKind::Player => ("PLAYER", "👤"),
            EntityKind::Club => ("CLUB", "🏟️"),
        };
        Self::named(stage_name, stage_emoji)
    }

    pub fn named(stage_name: &'static str, stage_emoji: &'static str) -> Self {
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, batches: usize, rows: usize) {
        info!(
            "[{}] {} 🚀 Starting {} merge: {} batches, {} rows",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            batches,
            rows
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_batch(&self, stats: &BatchStats) {
        info!(
            "[{}] {} 📦 Batch '{}': {} rows → {} new, {} updated, {} records added ({:.2}s)",
            self.stage_name,
            self.stage_emoji,
            stats.source_tag,
            stats.rows,
            stats.entities_created,
            stats.entities_updated,
            stats.records_added,
            stats.duration_secs
        );
        let methods: Vec<String> = stats
            .by_method
            .iter()
            .map(|(method, count)| format!("{}={}", method, count))
            .collect();
        if !methods.is_empty() {
            info!(
                "[{}] {} 🎯 Resolution: {}",
                self.stage_name,
                self.stage_emoji,
                methods.join(", ")
            );
        }
    }

    pub fn log_links(&self, stats: &LinkStats) {
        let percent = if stats.players_considered > 0 {
            (stats.linked() as f64 / stats.players_considered as f64) * 100.0
        } else {
            0.0
        };
        info!(
            "[{}] {} 🔗 Club links: {}/{} players linked ({:.1}%): {} by id, {} by name",
            self.stage_name,
            self.stage_emoji,
            stats.linked(),
            stats.players_considered,
            percent,
            stats.linked_by_id,
            stats.linked_by_name
        );
        if stats.unresolved > 0 {
            warn!(
                "[{}] {} ⚠️  {} players name a club that could not be resolved",
                self.stage_name, self.stage_emoji, stats.unresolved
            );
        }
    }

    pub fn log_completion(&self, entities: usize, indexed_names: usize) {
        info!(
            "[{}] {} 🎉 COMPLETED: {} canonical entities, {} indexed names in {:.2?}",
            self.stage_name,
            self.stage_emoji,
            entities,
            indexed_names,
            self.start_time.elapsed()
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }
}
