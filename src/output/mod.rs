// src/output/mod.rs
//! Grouped JSON output: one file set per partition key, plus master dumps
//! of every player and club, raw competition and injury rows, and an index
//! of everything written.

pub mod partition;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::entity_identification::store::CanonicalRecordStore;
use crate::models::core::{CanonicalEntity, Field, RawRow, SourceKind};
use crate::sources::SourceBatch;

pub use partition::{linked_club, partition, Group, PartitionKey};

static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-]+").unwrap());

pub const PLAYERS_MASTER_FILE: &str = "players/master_players.json";
pub const CLUBS_MASTER_FILE: &str = "clubs/clubs_master.json";
pub const INDEX_FILE: &str = "index/index.json";
pub const COMPETITIONS_DUMP_FILE: &str = "competitions.json";
pub const INJURIES_DUMP_FILE: &str = "injuries.json";

/// Sources whose raw rows are also dumped as-is, and the file they go to.
const RAW_DUMPS: [(SourceKind, &str); 2] = [
    (SourceKind::Competitions, COMPETITIONS_DUMP_FILE),
    (SourceKind::Injuries, INJURIES_DUMP_FILE),
];

/// Lowercased, trimmed group name with runs of characters outside `[\w-]`
/// replaced by `_`.
pub fn safe_file_name(group_name: &str) -> String {
    let safe = UNSAFE_FILE_CHARS
        .replace_all(&group_name.trim().to_lowercase(), "_")
        .into_owned();
    if safe.is_empty() {
        "unknown".to_string()
    } else {
        safe
    }
}

/// Club fields copied into each player document.
#[derive(Debug, Serialize)]
pub struct ClubInfo<'a> {
    pub club_id: &'a str,
    pub club_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<&'a str>,
}

impl<'a> ClubInfo<'a> {
    fn from_club(club: &'a CanonicalEntity) -> Self {
        Self {
            club_id: &club.entity_id,
            club_name: &club.canonical_name,
            country: club.field_text(Field::Country),
            competition: club.field_text(Field::Competition),
            logo_url: club.field_text(Field::LogoUrl),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerDocument<'a> {
    #[serde(flatten)]
    pub player: &'a CanonicalEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_info: Option<ClubInfo<'a>>,
}

impl<'a> PlayerDocument<'a> {
    pub fn new(player: &'a CanonicalEntity, clubs: &'a CanonicalRecordStore) -> Self {
        Self {
            player,
            club_info: linked_club(player, clubs).map(ClubInfo::from_club),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupPayload<'a> {
    pub category: &'a str,
    pub group: &'a str,
    pub total: usize,
    pub data: &'a [PlayerDocument<'a>],
    pub generated_at: &'a str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IndexEntry {
    pub group: String,
    pub file: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub players: usize,
    pub clubs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunIndex {
    pub run_id: String,
    pub generated_at: String,
    pub totals: Totals,
    pub leagues: Vec<IndexEntry>,
    pub countries: Vec<IndexEntry>,
    pub positions: Vec<IndexEntry>,
    pub clubs: Vec<IndexEntry>,
    /// Every path written, relative to the output root.
    pub files: Vec<String>,
}

impl RunIndex {
    fn entries_mut(&mut self, key: PartitionKey) -> &mut Vec<IndexEntry> {
        match key {
            PartitionKey::League => &mut self.leagues,
            PartitionKey::Country => &mut self.countries,
            PartitionKey::Position => &mut self.positions,
            PartitionKey::Club => &mut self.clubs,
        }
    }
}

pub struct OutputWriter {
    root: PathBuf,
    max_per_file: usize,
    dry_run: bool,
    run_id: String,
    generated_at: String,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>, max_per_file: usize, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            max_per_file: max_per_file.max(1),
            dry_run,
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Writes every group file, both master dumps, the raw competition and
    /// injury rows of `sources`, and the index.
    pub fn write_all(
        &self,
        players: &CanonicalRecordStore,
        clubs: &CanonicalRecordStore,
        sources: &[SourceBatch],
    ) -> Result<RunIndex> {
        let documents: Vec<PlayerDocument> = players
            .all()
            .map(|player| PlayerDocument::new(player, clubs))
            .collect();

        let mut index = RunIndex {
            run_id: self.run_id.clone(),
            generated_at: self.generated_at.clone(),
            totals: Totals {
                players: players.len(),
                clubs: clubs.len(),
            },
            leagues: Vec::new(),
            countries: Vec::new(),
            positions: Vec::new(),
            clubs: Vec::new(),
            files: Vec::new(),
        };

        self.write_json(PLAYERS_MASTER_FILE, &documents)?;
        index.files.push(PLAYERS_MASTER_FILE.to_string());
        info!("💾 Saved {} ({} players)", PLAYERS_MASTER_FILE, documents.len());

        for key in PartitionKey::ALL {
            let groups = partition(players, clubs, key);
            let entries = self.write_grouped(key, &groups, clubs)?;
            index.files.extend(entries.iter().map(|e| format!("{}/{}", key.folder(), e.file)));
            *index.entries_mut(key) = entries;
        }

        let club_list: Vec<&CanonicalEntity> = clubs.all().collect();
        self.write_json(CLUBS_MASTER_FILE, &club_list)?;
        index.files.push(CLUBS_MASTER_FILE.to_string());
        info!("💾 Saved {} ({} clubs)", CLUBS_MASTER_FILE, club_list.len());

        for (kind, file) in RAW_DUMPS {
            let rows: Vec<&RawRow> = sources
                .iter()
                .filter(|batch| batch.kind == kind)
                .flat_map(|batch| batch.rows.iter())
                .collect();
            self.write_json(file, &rows)?;
            index.files.push(file.to_string());
            info!("💾 Saved {} ({} raw {} rows)", file, rows.len(), kind);
        }

        self.write_json(INDEX_FILE, &index)?;
        info!("🗂️ Index written to {}", self.root.join(INDEX_FILE).display());
        Ok(index)
    }

    /// Writes one partition. Groups over `max_per_file` members are split
    /// into `<name>_part<N>.json` files.
    pub fn write_grouped(
        &self,
        key: PartitionKey,
        groups: &[Group],
        clubs: &CanonicalRecordStore,
    ) -> Result<Vec<IndexEntry>> {
        let mut used_names: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();

        for group in groups {
            let base = unique_name(safe_file_name(&group.name), &mut used_names);
            let chunked = group.members.len() > self.max_per_file;

            for (part, chunk) in group.members.chunks(self.max_per_file).enumerate() {
                let file = if chunked {
                    format!("{}_part{}.json", base, part + 1)
                } else {
                    format!("{}.json", base)
                };
                let data: Vec<PlayerDocument> = chunk
                    .iter()
                    .map(|player| PlayerDocument::new(player, clubs))
                    .collect();
                let payload = GroupPayload {
                    category: key.category(),
                    group: &group.name,
                    total: data.len(),
                    data: &data,
                    generated_at: &self.generated_at,
                };
                self.write_json(&format!("{}/{}", key.folder(), file), &payload)?;
                debug!("💾 Saved {}/{} ({})", key.folder(), file, data.len());
                entries.push(IndexEntry {
                    group: group.name.clone(),
                    file,
                    count: data.len(),
                });
            }
        }
        info!(
            "💾 {} {} groups → {} files",
            groups.len(),
            key.category(),
            entries.len()
        );
        Ok(entries)
    }

    fn write_json<T: Serialize + ?Sized>(&self, relative: &str, value: &T) -> Result<()> {
        let path = self.root.join(relative);
        if self.dry_run {
            debug!("Dry run: skipping {}", path.display());
            return Ok(());
        }
        write_json_file(&path, value)
    }
}

fn unique_name(base: String, used: &mut HashSet<String>) -> String {
    let mut name = base.clone();
    let mut suffix = 2;
    while used.contains(&name) {
        name = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    used.insert(name.clone());
    name
}

pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::club_link::CLUB_LINK;
    use crate::matching::matcher::EntityMatcher;
    use crate::models::core::{EntityKind, FieldValue};
    use serde_json::Value;
    use tempfile::TempDir;

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn stores(players_in_arsenal: usize) -> (CanonicalRecordStore, CanonicalRecordStore) {
        let mut clubs = CanonicalRecordStore::new(EntityKind::Club, EntityMatcher::default());
        let (_, club) = clubs.get_or_create("11", "");
        club.fields.insert(Field::Country, FieldValue::Text("England".into()));
        clubs.register_name("11", "Arsenal FC");

        let mut players = CanonicalRecordStore::new(EntityKind::Player, EntityMatcher::default());
        for i in 0..players_in_arsenal {
            let id = format!("p{}", i);
            let (_, p) = players.get_or_create(&id, "");
            p.fields.insert(Field::Position, FieldValue::Text("Defender".into()));
            p.links.insert(CLUB_LINK.to_string(), "11".into());
        }
        (players, clubs)
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("  Premier League "), "premier_league");
        assert_eq!(safe_file_name("Bayern München / FCB"), "bayern_münchen_fcb");
        assert_eq!(safe_file_name("Saint-Étienne"), "saint-étienne");
        assert_eq!(safe_file_name(" ?! "), "_");
        assert_eq!(safe_file_name("   "), "unknown");
    }

    #[test]
    fn test_write_all_layout_and_index() {
        let dir = TempDir::new().unwrap();
        let (players, clubs) = stores(2);
        let writer = OutputWriter::new(dir.path(), 800, false);
        let mut injuries = SourceBatch::new(SourceKind::Injuries);
        injuries.rows.push(
            [("player_id", "p0"), ("injury_reason", "Knee"), ("days_missed", "")]
                .into_iter()
                .collect(),
        );
        let teams = SourceBatch::new(SourceKind::Teams);
        let index = writer.write_all(&players, &clubs, &[teams, injuries]).unwrap();

        assert!(dir.path().join(PLAYERS_MASTER_FILE).exists());
        assert!(dir.path().join(CLUBS_MASTER_FILE).exists());

        let raw_injuries = read(&dir.path().join(INJURIES_DUMP_FILE));
        assert_eq!(raw_injuries[0]["injury_reason"], "Knee");
        assert_eq!(raw_injuries[0]["days_missed"], "");
        let raw_competitions = read(&dir.path().join(COMPETITIONS_DUMP_FILE));
        assert_eq!(raw_competitions.as_array().unwrap().len(), 0);
        assert_eq!(index.totals.players, 2);
        assert_eq!(index.leagues, Vec::new());
        assert_eq!(index.countries[0].file, "england.json");

        let group = read(&dir.path().join("clubs/arsenal_fc.json"));
        assert_eq!(group["category"], "club");
        assert_eq!(group["group"], "Arsenal FC");
        assert_eq!(group["total"], 2);
        assert_eq!(group["data"][0]["entity_id"], "p0");
        assert_eq!(group["data"][0]["club_info"]["country"], "England");

        let written = read(&dir.path().join(INDEX_FILE));
        assert_eq!(written["run_id"], writer.run_id());
        assert_eq!(written["positions"][0]["group"], "Defender");
        let files: Vec<&str> = written["files"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(files.len(), 7);
        assert!(files.contains(&COMPETITIONS_DUMP_FILE));
        assert!(files.contains(&INJURIES_DUMP_FILE));
    }

    #[test]
    fn test_large_groups_are_chunked() {
        let dir = TempDir::new().unwrap();
        let (players, clubs) = stores(5);
        let writer = OutputWriter::new(dir.path(), 2, false);
        let groups = partition(&players, &clubs, PartitionKey::Position);
        let entries = writer.write_grouped(PartitionKey::Position, &groups, &clubs).unwrap();

        let files: Vec<&str> = entries.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["defender_part1.json", "defender_part2.json", "defender_part3.json"]);
        let counts: Vec<usize> = entries.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        assert_eq!(read(&dir.path().join("positions/defender_part3.json"))["total"], 1);
    }

    #[test]
    fn test_colliding_group_names_get_suffixes() {
        let dir = TempDir::new().unwrap();
        let (players, clubs) = stores(2);
        let members: Vec<&CanonicalEntity> = players.all().collect();
        let groups = vec![
            Group { name: "Real Madrid".into(), members: vec![members[0]] },
            Group { name: "real  madrid".into(), members: vec![members[1]] },
        ];
        let writer = OutputWriter::new(dir.path(), 800, false);
        let entries = writer.write_grouped(PartitionKey::Club, &groups, &clubs).unwrap();
        assert_eq!(entries[0].file, "real_madrid.json");
        assert_eq!(entries[1].file, "real_madrid_2.json");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let (players, clubs) = stores(1);
        let index = OutputWriter::new(&out, 800, true)
            .write_all(&players, &clubs, &[SourceBatch::new(SourceKind::Competitions)])
            .unwrap();
        assert!(!out.exists());
        assert_eq!(index.clubs[0].group, "Arsenal FC");
    }
}
