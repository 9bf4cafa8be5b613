// src/sources/mod.rs
//! Data-lake acquisition: find CSV files, decide which dataset each one
//! belongs to, and parse them into tagged row batches.

pub mod classify;
pub mod reader;

use anyhow::Result;
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::core::{RawRow, SourceKind};

pub use classify::classify;
pub use reader::{read_headers, read_rows, read_rows_from_reader, scan_csv_files};

/// All rows of one dataset kind, across every file classified as that kind.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub kind: SourceKind,
    /// Provenance tag recorded on every row of the batch.
    pub tag: String,
    pub rows: Vec<RawRow>,
    pub files: Vec<PathBuf>,
}

impl SourceBatch {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            tag: kind.as_str().to_string(),
            rows: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Scans `root` and returns one batch per known dataset kind, in ingestion
/// order. Unknown and unreadable files are logged and skipped.
pub fn load_batches(root: &Path) -> Result<Vec<SourceBatch>> {
    let files = scan_csv_files(root)?;
    if files.is_empty() {
        warn!("⚠️ No CSV files found under {}", root.display());
    } else {
        info!("📂 Found {} CSV files under {}", files.len(), root.display());
    }

    let mut batches: BTreeMap<SourceKind, SourceBatch> = BTreeMap::new();
    let mut skipped = 0usize;

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // a file whose header cannot be read is classified by name alone
        let headers = read_headers(&path).unwrap_or_default();
        let kind = classify(&file_name, &headers);
        if kind == SourceKind::Unknown {
            warn!("Skipping {}: not a recognised dataset", path.display());
            skipped += 1;
            continue;
        }

        match read_rows(&path) {
            Ok(rows) => {
                info!("  {} -> {} ({} rows)", file_name, kind, rows.len());
                let batch = batches.entry(kind).or_insert_with(|| SourceBatch::new(kind));
                batch.rows.extend(rows);
                batch.files.push(path);
            }
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                skipped += 1;
            }
        }
    }

    let ordered: Vec<SourceBatch> = SourceKind::INGEST_ORDER
        .iter()
        .filter_map(|kind| batches.remove(kind))
        .collect();

    info!("File classification:");
    for batch in &ordered {
        info!("  - {}: {} files, {} rows", batch.kind, batch.files.len(), batch.len());
    }
    if skipped > 0 {
        info!("  - skipped: {} files", skipped);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_batches_groups_and_orders_by_kind() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("transfermarkt")).unwrap();
        fs::write(
            root.join("transfermarkt/team_details.csv"),
            "club_id,club_name,country_name\n131,FC Barcelona,Spain\n",
        )
        .unwrap();
        fs::write(
            root.join("transfermarkt/player_profiles.csv"),
            "player_id,player_name,current_club_name\n28003,Lionel Messi,Inter Miami\n",
        )
        .unwrap();
        fs::write(
            root.join("player_injuries.csv"),
            "player_id,injury_reason,days_missed\n28003,Hamstring,21\n",
        )
        .unwrap();
        fs::write(root.join("transfers.csv"), "from,to\na,b\n").unwrap();

        let batches = load_batches(root).unwrap();
        let kinds: Vec<SourceKind> = batches.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![SourceKind::Players, SourceKind::Injuries, SourceKind::Teams]
        );
        assert_eq!(batches[0].tag, "players");
        assert_eq!(batches[0].rows[0].get("player_name"), Some("Lionel Messi"));
        assert_eq!(batches[2].files.len(), 1);
    }

    #[test]
    fn test_empty_data_lake_yields_no_batches() {
        let dir = TempDir::new().unwrap();
        assert!(load_batches(dir.path()).unwrap().is_empty());
    }
}
