// src/models/stats_models.rs
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::core::EntityKind;

/// How a row was tied to its canonical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Row id already present in the store.
    IdHint,
    /// Row id not seen before; entity created under it.
    NewFromId,
    /// Normalized name found in the name index.
    NameIndex,
    /// Matcher cascade; carries the name of the deciding pass.
    Matched(&'static str),
    /// Entity created under a slug of the display name.
    NewSlug,
    /// No id and no usable name; counter-based id.
    Placeholder,
}

impl ResolutionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionMethod::IdHint => "id",
            ResolutionMethod::NewFromId => "new_from_id",
            ResolutionMethod::NameIndex => "name_index",
            ResolutionMethod::Matched(pass) => pass,
            ResolutionMethod::NewSlug => "new_slug",
            ResolutionMethod::Placeholder => "placeholder",
        }
    }

    pub fn creates_entity(&self) -> bool {
        matches!(
            self,
            ResolutionMethod::NewFromId | ResolutionMethod::NewSlug | ResolutionMethod::Placeholder
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub source_tag: String,
    pub kind: EntityKind,
    pub rows: usize,
    pub entities_created: usize,
    pub entities_updated: usize,
    pub records_added: usize,
    pub by_method: BTreeMap<&'static str, usize>,
    pub duration_secs: f64,
}

impl BatchStats {
    pub fn new(source_tag: &str, kind: EntityKind) -> Self {
        Self {
            source_tag: source_tag.to_string(),
            kind,
            rows: 0,
            entities_created: 0,
            entities_updated: 0,
            records_added: 0,
            by_method: BTreeMap::new(),
            duration_secs: 0.0,
        }
    }

    pub fn record(&mut self, method: ResolutionMethod) {
        self.rows += 1;
        if method.creates_entity() {
            self.entities_created += 1;
        } else {
            self.entities_updated += 1;
        }
        *self.by_method.entry(method.label()).or_insert(0) += 1;
    }

    pub fn count(&self, label: &str) -> usize {
        self.by_method.get(label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkStats {
    pub players_considered: usize,
    pub linked_by_id: usize,
    pub linked_by_name: usize,
    pub unresolved: usize,
}

impl LinkStats {
    pub fn linked(&self) -> usize {
        self.linked_by_id + self.linked_by_name
    }
}
