// src/models/core.rs
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// One parsed CSV data row. Column order is preserved as read from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    columns: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, replacing the value if the column already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Column lookup, ASCII-case-insensitive on the column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
    }

    /// First alias carrying a non-blank value, trimmed.
    pub fn first_non_empty<S: AsRef<str>>(&self, aliases: &[S]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.get(alias.as_ref()))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// Copy of the row without blank values.
    pub fn non_empty(&self) -> RawRow {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Club,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Club => "club",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical dataset a CSV file belongs to. Also the provenance tag of its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Players,
    Injuries,
    Teams,
    Competitions,
    Unknown,
}

impl SourceKind {
    /// Players come before injuries so injuries resolve against known
    /// players; teams come before competitions for the same reason.
    pub const INGEST_ORDER: [SourceKind; 4] = [
        SourceKind::Players,
        SourceKind::Injuries,
        SourceKind::Teams,
        SourceKind::Competitions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Players => "players",
            SourceKind::Injuries => "injuries",
            SourceKind::Teams => "teams",
            SourceKind::Competitions => "competitions",
            SourceKind::Unknown => "unknown",
        }
    }

    /// Store the rows of this source are merged into.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            SourceKind::Players | SourceKind::Injuries => Some(EntityKind::Player),
            SourceKind::Teams | SourceKind::Competitions => Some(EntityKind::Club),
            SourceKind::Unknown => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic attributes of the canonical record. The set is closed; which
/// columns feed each one is decided by the alias tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // identity
    FullName,
    KnownAs,
    DateOfBirth,
    Age,
    PlaceOfBirth,
    CountryOfBirth,
    Nationality,
    Height,
    Weight,
    Position,
    OtherPositions,
    Foot,
    Status,
    Club,
    ClubId,
    ShirtNumber,
    Joined,
    Agent,
    // contract
    ContractStart,
    ContractExpiry,
    // market value
    MarketValue,
    MarketValueUpdated,
    HighestMarketValue,
    // performance
    League,
    Appearances,
    Goals,
    Assists,
    MinutesPlayed,
    NationalTeam,
    // club attributes
    ClubSlug,
    LogoUrl,
    Country,
    Competition,
    Website,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            FieldValue::Text(_) => None,
        }
    }
}

/// A small keyed record appended to an entity collection (an injury, a
/// competition entry).
pub type CollectionRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalEntity {
    pub entity_id: String,
    pub kind: EntityKind,
    pub canonical_name: String,
    pub fields: BTreeMap<Field, FieldValue>,
    pub records: BTreeMap<String, Vec<CollectionRecord>>,
    pub links: BTreeMap<String, String>,
    pub provenance: BTreeMap<String, Vec<RawRow>>,
}

impl CanonicalEntity {
    pub fn new(entity_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind,
            canonical_name: String::new(),
            fields: BTreeMap::new(),
            records: BTreeMap::new(),
            links: BTreeMap::new(),
            provenance: BTreeMap::new(),
        }
    }

    pub fn field(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn field_text(&self, field: Field) -> Option<&str> {
        self.fields
            .get(&field)
            .and_then(FieldValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// Appends a record unless an identical one is already in the collection.
    /// Returns whether the record was added.
    pub fn push_record(&mut self, collection: &str, record: CollectionRecord) -> bool {
        let list = self.records.entry(collection.to_string()).or_default();
        if list.contains(&record) {
            return false;
        }
        list.push(record);
        true
    }

    pub fn record_provenance(&mut self, source_tag: &str, row: RawRow) {
        self.provenance
            .entry(source_tag.to_string())
            .or_default()
            .push(row);
    }

    pub fn provenance_rows(&self) -> usize {
        self.provenance.values().map(Vec::len).sum()
    }
}
