// src/entity_identification/merge.rs
use indicatif::ProgressBar;
use log::debug;
use std::time::Instant;

use crate::entity_identification::aliases::AliasRegistry;
use crate::entity_identification::store::{CanonicalRecordStore, Resolution};
use crate::models::core::RawRow;
use crate::models::stats_models::BatchStats;

const PROGRESS_TICK_ROWS: usize = 500;

/// Result of merging one row.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub resolution: Resolution,
    pub fields_written: usize,
    pub records_added: usize,
}

/// Owns one canonical store for the duration of a run and folds raw rows
/// into it.
pub struct MergeEngine {
    store: CanonicalRecordStore,
    aliases: AliasRegistry,
}

impl MergeEngine {
    pub fn new(store: CanonicalRecordStore, aliases: AliasRegistry) -> Self {
        Self { store, aliases }
    }

    /// Merges one row and returns the id of the entity it landed in.
    pub fn ingest(&mut self, raw_row: &RawRow, source_tag: &str) -> String {
        self.ingest_detailed(raw_row, source_tag).resolution.entity_id
    }

    pub fn ingest_detailed(&mut self, raw_row: &RawRow, source_tag: &str) -> IngestOutcome {
        let table = self.aliases.table_for(source_tag);
        let id_hint = table.extract_id(raw_row);
        let display_name = table.extract_name(raw_row);

        let (resolution, entity) = self.store.get_or_create(id_hint, display_name);

        // empty values never reach the entity; see FieldAliases::extract
        let mut fields_written = 0;
        for field_aliases in &table.fields {
            if let Some(value) = field_aliases.extract(raw_row) {
                entity.fields.insert(field_aliases.field, value);
                fields_written += 1;
            }
        }

        let mut records_added = 0;
        for record_aliases in &table.records {
            if let Some(record) = record_aliases.extract(raw_row) {
                if entity.push_record(&record_aliases.collection, record) {
                    records_added += 1;
                }
            }
        }

        entity.record_provenance(source_tag, raw_row.non_empty());

        if !display_name.is_empty() {
            self.store.register_name(&resolution.entity_id, display_name);
        }

        debug!(
            "Merge[{}]: '{}' (id hint '{}') -> {} via {}{}",
            source_tag,
            display_name,
            id_hint,
            resolution.entity_id,
            resolution.method.label(),
            resolution
                .score
                .map(|s| format!(" ({:.3})", s))
                .unwrap_or_default()
        );

        IngestOutcome {
            resolution,
            fields_written,
            records_added,
        }
    }

    /// Ingests every row of one source batch, in order.
    pub fn ingest_batch(
        &mut self,
        rows: &[RawRow],
        source_tag: &str,
        progress: Option<&ProgressBar>,
    ) -> BatchStats {
        let start = Instant::now();
        let mut stats = BatchStats::new(source_tag, self.store.kind());

        for (i, row) in rows.iter().enumerate() {
            let outcome = self.ingest_detailed(row, source_tag);
            stats.record(outcome.resolution.method);
            stats.records_added += outcome.records_added;

            if let Some(pb) = progress {
                pb.inc(1);
                if i % PROGRESS_TICK_ROWS == 0 {
                    pb.set_message(format!(
                        "{}: {} entities ({} new)",
                        source_tag,
                        self.store.len(),
                        stats.entities_created
                    ));
                }
            }
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        stats
    }

    pub fn store(&self) -> &CanonicalRecordStore {
        &self.store
    }

    pub fn into_store(self) -> CanonicalRecordStore {
        self.store
    }
}
