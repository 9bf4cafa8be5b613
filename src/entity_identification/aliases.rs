// src/entity_identification/aliases.rs
//! Column alias tables, one per source dataset.
//!
//! Source CSVs name the same attribute differently (`player_name` vs `name`,
//! `club_id` vs `team_id`). Each table lists, per semantic field, the columns
//! accepted for it; the first non-empty column wins.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::models::core::{CollectionRecord, Field, FieldValue, RawRow, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Text,
    /// Comma-separated list (nationalities, alternative positions).
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub field: Field,
    pub aliases: Vec<String>,
    #[serde(default)]
    pub kind: ValueKind,
}

impl FieldAliases {
    /// Parsed value for this field, or `None` when the row has nothing
    /// usable under any alias.
    pub fn extract(&self, row: &RawRow) -> Option<FieldValue> {
        let raw = row.first_non_empty(&self.aliases)?;
        match self.kind {
            ValueKind::Text => Some(FieldValue::Text(raw.to_string())),
            ValueKind::List => {
                let items = parse_list(raw);
                (!items.is_empty()).then_some(FieldValue::List(items))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: String,
    pub aliases: Vec<String>,
}

/// A collection the row contributes one record to (an injury spell, a
/// competition participation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordAliases {
    pub collection: String,
    pub fields: Vec<RecordField>,
}

impl RecordAliases {
    pub fn extract(&self, row: &RawRow) -> Option<CollectionRecord> {
        let record: CollectionRecord = self
            .fields
            .iter()
            .filter_map(|f| {
                row.first_non_empty(&f.aliases)
                    .map(|v| (f.name.clone(), v.to_string()))
            })
            .collect();
        (!record.is_empty()).then_some(record)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    pub id: Vec<String>,
    pub name: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldAliases>,
    #[serde(default)]
    pub records: Vec<RecordAliases>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn text(field: Field, aliases: &[&str]) -> FieldAliases {
    FieldAliases {
        field,
        aliases: strings(aliases),
        kind: ValueKind::Text,
    }
}

fn list(field: Field, aliases: &[&str]) -> FieldAliases {
    FieldAliases {
        field,
        aliases: strings(aliases),
        kind: ValueKind::List,
    }
}

fn column(name: &str, aliases: &[&str]) -> RecordField {
    RecordField {
        name: name.to_string(),
        aliases: strings(aliases),
    }
}

fn record(collection: &str, fields: Vec<RecordField>) -> RecordAliases {
    RecordAliases {
        collection: collection.to_string(),
        fields,
    }
}

impl AliasTable {
    pub fn extract_id<'r>(&self, row: &'r RawRow) -> &'r str {
        row.first_non_empty(&self.id).unwrap_or("")
    }

    pub fn extract_name<'r>(&self, row: &'r RawRow) -> &'r str {
        row.first_non_empty(&self.name).unwrap_or("")
    }

    /// Used for source tags without a table of their own.
    pub fn generic() -> Self {
        Self {
            id: strings(&["id"]),
            name: strings(&["name"]),
            fields: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn players() -> Self {
        Self {
            id: strings(&["player_id", "id"]),
            name: strings(&["player_name", "name"]),
            fields: vec![
                text(Field::FullName, &["full_name", "name_in_home_country"]),
                text(Field::KnownAs, &["known_as", "nickname"]),
                text(Field::DateOfBirth, &["date_of_birth", "dob"]),
                text(Field::Age, &["age"]),
                text(Field::PlaceOfBirth, &["place_of_birth", "city_of_birth"]),
                text(Field::CountryOfBirth, &["country_of_birth"]),
                list(Field::Nationality, &["citizenship", "nationality"]),
                text(Field::Height, &["height", "height_in_cm"]),
                text(Field::Weight, &["weight", "weight_in_kg"]),
                text(Field::Position, &["position", "main_position"]),
                list(Field::OtherPositions, &["other_positions", "other_position"]),
                text(Field::Foot, &["foot"]),
                text(Field::Status, &["player_status", "status"]),
                text(
                    Field::Club,
                    &["current_club", "current_club_name", "club", "club_name"],
                ),
                text(Field::ClubId, &["current_club_id", "club_id"]),
                text(Field::ShirtNumber, &["shirt_number"]),
                text(Field::Joined, &["joined", "date_joined"]),
                text(Field::Agent, &["player_agent", "agent"]),
                text(Field::ContractStart, &["contract_start"]),
                text(
                    Field::ContractExpiry,
                    &["contract_expiry", "contract_expiration_date"],
                ),
                text(Field::MarketValue, &["market_value_in_eur", "market_value"]),
                text(Field::MarketValueUpdated, &["last_market_value_update"]),
                text(
                    Field::HighestMarketValue,
                    &["highest_market_value_in_eur", "highest_market_value"],
                ),
                text(Field::League, &["league", "competition_name"]),
                text(Field::Appearances, &["appearances", "matches"]),
                text(Field::Goals, &["goals"]),
                text(Field::Assists, &["assists"]),
                text(Field::MinutesPlayed, &["minutes_played", "minutes"]),
                text(Field::NationalTeam, &["national_team"]),
            ],
            records: Vec::new(),
        }
    }

    /// Injury rows carry their own `id` column, so only `player_id` counts
    /// as a player id here.
    pub fn injuries() -> Self {
        Self {
            id: strings(&["player_id"]),
            name: strings(&["player_name", "name"]),
            fields: Vec::new(),
            records: vec![record(
                "injuries",
                vec![
                    column("injury", &["injury", "injury_reason", "type"]),
                    column("start", &["injury_start", "from_date", "start_date"]),
                    column("end", &["injury_end", "end_date"]),
                    column("days", &["days", "days_missed"]),
                    column("games_missed", &["games_missed", "matches_missed"]),
                    column("season", &["season_name", "season"]),
                    column("club", &["club", "team"]),
                    column("source", &["url", "source_url"]),
                ],
            )],
        }
    }

    pub fn teams() -> Self {
        Self {
            id: strings(&["club_id", "team_id", "id"]),
            name: strings(&["club_name", "team_name", "name"]),
            fields: vec![
                text(Field::ClubSlug, &["club_slug"]),
                text(Field::LogoUrl, &["logo_url", "crest_url"]),
                text(Field::Country, &["country_name", "country"]),
                text(Field::Competition, &["competition_name", "league"]),
                text(Field::Website, &["website", "source_url"]),
            ],
            records: Vec::new(),
        }
    }

    /// Competition rows carry a competition id, never a club id, under `id`.
    pub fn competitions() -> Self {
        Self {
            id: strings(&["club_id", "team_id"]),
            name: strings(&["club_name", "team_name"]),
            fields: vec![text(Field::Country, &["country_name"])],
            records: vec![record(
                "competitions",
                vec![
                    column("competition_id", &["competition_id"]),
                    column("competition_name", &["competition_name", "competition"]),
                    column("season", &["season_name", "season"]),
                    column("url", &["competition_url", "url"]),
                ],
            )],
        }
    }

    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Players => Self::players(),
            SourceKind::Injuries => Self::injuries(),
            SourceKind::Teams => Self::teams(),
            SourceKind::Competitions => Self::competitions(),
            SourceKind::Unknown => Self::generic(),
        }
    }
}

/// Splits a comma-separated cell into trimmed, non-empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Source tag -> alias table. Tags without an entry use the generic table.
#[derive(Debug, Clone)]
pub struct AliasRegistry {
    tables: BTreeMap<String, AliasTable>,
    fallback: AliasTable,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        let tables = SourceKind::INGEST_ORDER
            .iter()
            .map(|kind| (kind.as_str().to_string(), AliasTable::for_source(*kind)))
            .collect();
        Self {
            tables,
            fallback: AliasTable::generic(),
        }
    }
}

impl AliasRegistry {
    pub fn empty() -> Self {
        Self {
            tables: BTreeMap::new(),
            fallback: AliasTable::generic(),
        }
    }

    pub fn insert(&mut self, source_tag: &str, table: AliasTable) {
        self.tables.insert(source_tag.to_string(), table);
    }

    pub fn table_for(&self, source_tag: &str) -> &AliasTable {
        self.tables.get(source_tag).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, source_tag: &str) -> bool {
        self.tables.contains_key(source_tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Replaces tables with those in a JSON object of `tag -> table`.
    /// Returns how many tables were replaced or added.
    pub fn apply_overrides_json(&mut self, json: &str) -> Result<usize> {
        let overrides: BTreeMap<String, AliasTable> =
            serde_json::from_str(json).context("Alias overrides are not a valid tag -> table map")?;
        let count = overrides.len();
        for (tag, table) in overrides {
            info!("Alias table for '{}' overridden ({} fields)", tag, table.fields.len());
            self.tables.insert(tag, table);
        }
        Ok(count)
    }

    pub fn load_overrides(&mut self, path: &Path) -> Result<usize> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read alias file {}", path.display()))?;
        self.apply_overrides_json(&json)
            .with_context(|| format!("Failed to apply alias file {}", path.display()))
    }
}
