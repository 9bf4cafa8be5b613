// src/entity_identification/store.rs
use log::debug;
use std::collections::HashMap;

use crate::matching::matcher::EntityMatcher;
use crate::matching::normalize::{normalize, slugify};
use crate::models::core::{CanonicalEntity, EntityKind};
use crate::models::stats_models::ResolutionMethod;

/// Outcome of resolving a row (or a name) to a canonical entity id.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entity_id: String,
    pub method: ResolutionMethod,
    /// Winning score when the matcher cascade decided.
    pub score: Option<f64>,
}

impl Resolution {
    fn new(entity_id: impl Into<String>, method: ResolutionMethod) -> Self {
        Self {
            entity_id: entity_id.into(),
            method,
            score: None,
        }
    }

    pub fn created(&self) -> bool {
        self.method.creates_entity()
    }
}

/// Identity-keyed canonical entities of one kind, plus the normalized-name
/// index used to skip the matcher for names already seen.
pub struct CanonicalRecordStore {
    kind: EntityKind,
    entities: HashMap<String, CanonicalEntity>,
    creation_order: Vec<String>,
    name_index: HashMap<String, String>,
    /// entity_id -> normalized current canonical name (matcher candidates)
    normalized_names: HashMap<String, String>,
    matcher: EntityMatcher,
}

impl CanonicalRecordStore {
    pub fn new(kind: EntityKind, matcher: EntityMatcher) -> Self {
        Self {
            kind,
            entities: HashMap::new(),
            creation_order: Vec::new(),
            name_index: HashMap::new(),
            normalized_names: HashMap::new(),
            matcher,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Resolves `(id hint, display name)` to an entity, creating it when
    /// nothing matches. Order: known id, new id, name index, matcher, slug.
    pub fn get_or_create(
        &mut self,
        entity_id_hint: &str,
        display_name: &str,
    ) -> (Resolution, &mut CanonicalEntity) {
        let resolution = self.resolve(entity_id_hint, display_name);
        if resolution.created() {
            debug!(
                "Store[{}]: creating '{}' via {}",
                self.kind,
                resolution.entity_id,
                resolution.method.label()
            );
            self.creation_order.push(resolution.entity_id.clone());
        }
        let kind = self.kind;
        let entity = self
            .entities
            .entry(resolution.entity_id.clone())
            .or_insert_with_key(|id| CanonicalEntity::new(id.clone(), kind));
        (resolution, entity)
    }

    fn resolve(&self, entity_id_hint: &str, display_name: &str) -> Resolution {
        let id_hint = entity_id_hint.trim();
        if !id_hint.is_empty() {
            let method = if self.entities.contains_key(id_hint) {
                ResolutionMethod::IdHint
            } else {
                ResolutionMethod::NewFromId
            };
            return Resolution::new(id_hint, method);
        }

        let normalized = normalize(display_name);
        if let Some(found) = self.lookup_normalized(&normalized) {
            return found;
        }

        if normalized.is_empty() {
            let base = format!("{}_{}", self.kind.as_str(), self.entities.len() + 1);
            Resolution::new(self.unique_id(base), ResolutionMethod::Placeholder)
        } else {
            Resolution::new(self.unique_id(slugify(&normalized)), ResolutionMethod::NewSlug)
        }
    }

    /// Read-only resolution of a name: name index first, then the matcher.
    pub fn lookup(&self, name: &str) -> Option<Resolution> {
        self.lookup_normalized(&normalize(name))
    }

    fn lookup_normalized(&self, normalized: &str) -> Option<Resolution> {
        if normalized.is_empty() {
            return None;
        }
        if let Some(id) = self.find_by_name(normalized) {
            return Some(Resolution::new(id, ResolutionMethod::NameIndex));
        }
        // TODO: block candidates by first token once stores grow past ~100k names
        self.matcher
            .best_match_normalized(normalized, self.candidates())
            .map(|decision| Resolution {
                entity_id: decision.entity_id,
                method: ResolutionMethod::Matched(decision.pass),
                score: Some(decision.score),
            })
    }

    fn candidates(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.creation_order.iter().filter_map(move |id| {
            self.normalized_names
                .get(id)
                .map(|name| (id.as_str(), name.as_str()))
        })
    }

    fn unique_id(&self, base: String) -> String {
        if !self.entities.contains_key(&base) {
            return base;
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if !self.entities.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn find_by_name(&self, normalized_name: &str) -> Option<&str> {
        self.name_index.get(normalized_name).map(String::as_str)
    }

    /// Sets the entity's canonical name and indexes its normalized form.
    /// Names that normalize to nothing are kept as display text only.
    pub fn register_name(&mut self, entity_id: &str, display_name: &str) {
        let display = display_name.trim();
        if display.is_empty() {
            return;
        }
        let Some(entity) = self.entities.get_mut(entity_id) else {
            debug!("Store[{}]: register_name for unknown id '{}'", self.kind, entity_id);
            return;
        };
        entity.canonical_name = display.to_string();

        let normalized = normalize(display);
        if normalized.is_empty() {
            return;
        }
        self.normalized_names
            .insert(entity_id.to_string(), normalized.clone());
        if let Some(previous) = self.name_index.insert(normalized.clone(), entity_id.to_string()) {
            if previous != entity_id {
                debug!(
                    "Store[{}]: name '{}' now points at {} (was {})",
                    self.kind, normalized, entity_id, previous
                );
            }
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&CanonicalEntity> {
        self.entities.get(entity_id)
    }

    pub fn get_mut(&mut self, entity_id: &str) -> Option<&mut CanonicalEntity> {
        self.entities.get_mut(entity_id)
    }

    /// Entities in creation order.
    pub fn all(&self) -> impl Iterator<Item = &CanonicalEntity> + '_ {
        self.creation_order
            .iter()
            .filter_map(move |id| self.entities.get(id))
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut CanonicalEntity> + '_ {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn indexed_names(&self) -> usize {
        self.name_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CanonicalRecordStore {
        CanonicalRecordStore::new(EntityKind::Player, EntityMatcher::default())
    }

    fn create(store: &mut CanonicalRecordStore, id: &str, name: &str) -> Resolution {
        let (resolution, _) = store.get_or_create(id, name);
        store.register_name(&resolution.entity_id, name);
        resolution
    }

    #[test]
    fn test_id_hint_creates_then_reuses() {
        let mut store = store();
        let first = create(&mut store, "28003", "Lionel Messi");
        assert_eq!(first.method, ResolutionMethod::NewFromId);
        let second = create(&mut store, " 28003 ", "Somebody Else");
        assert_eq!(second.method, ResolutionMethod::IdHint);
        assert_eq!(second.entity_id, "28003");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_name_index_before_matcher() {
        let mut store = store();
        create(&mut store, "", "Erling Haaland");
        let (resolution, entity) = store.get_or_create("", "ERLING  haaland!");
        assert_eq!(resolution.method, ResolutionMethod::NameIndex);
        assert_eq!(entity.entity_id, "erling_haaland");
    }

    #[test]
    fn test_matcher_resolves_variants() {
        let mut store = store();
        create(&mut store, "7", "Lionel Messi");
        let (resolution, _) = store.get_or_create("", "L. Messi");
        assert_eq!(resolution.entity_id, "7");
        assert_eq!(resolution.method, ResolutionMethod::Matched("token_overlap"));
        assert_eq!(resolution.score, Some(1.0));
    }

    #[test]
    fn test_slug_collisions_get_suffixes() {
        let mut store = CanonicalRecordStore::new(
            EntityKind::Player,
            EntityMatcher::with_passes(Vec::new()),
        );
        // an id-keyed entity already owns the slug
        store.get_or_create("cristiano_ronaldo", "");
        let (second, _) = store.get_or_create("", "Cristiano Ronaldo");
        assert_eq!(second.entity_id, "cristiano_ronaldo_2");
        store.register_name("cristiano_ronaldo_2", "Ronaldo C");
        let (third, _) = store.get_or_create("", "Cristiano Ronaldo");
        assert_eq!(third.entity_id, "cristiano_ronaldo_3");
    }

    #[test]
    fn test_placeholder_for_missing_id_and_name() {
        let mut store = store();
        let (first, _) = store.get_or_create("", "  ");
        assert_eq!(first.method, ResolutionMethod::Placeholder);
        assert_eq!(first.entity_id, "player_1");
        let (second, _) = store.get_or_create("", "?!");
        assert_eq!(second.entity_id, "player_2");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_placeholder_skips_taken_ids() {
        let mut store = store();
        store.get_or_create("player_2", "");
        let (placeholder, _) = store.get_or_create("", "");
        assert_eq!(placeholder.entity_id, "player_2_2");
    }

    #[test]
    fn test_register_name_keeps_old_names_indexed() {
        let mut store = store();
        create(&mut store, "7", "Lionel Messi");
        store.register_name("7", "Leo Messi");
        assert_eq!(store.get("7").unwrap().canonical_name, "Leo Messi");
        assert_eq!(store.find_by_name("lionel messi"), Some("7"));
        assert_eq!(store.find_by_name("leo messi"), Some("7"));
        assert_eq!(store.indexed_names(), 2);
    }

    #[test]
    fn test_register_name_ignores_blank_and_unknown() {
        let mut store = store();
        create(&mut store, "7", "Lionel Messi");
        store.register_name("7", "   ");
        store.register_name("missing", "Nobody");
        assert_eq!(store.get("7").unwrap().canonical_name, "Lionel Messi");
        assert!(store.find_by_name("nobody").is_none());
    }

    #[test]
    fn test_all_in_creation_order() {
        let mut store = store();
        create(&mut store, "b", "Bukayo Saka");
        create(&mut store, "a", "Martin Odegaard");
        create(&mut store, "", "Declan Rice");
        let ids: Vec<&str> = store.all().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "declan_rice"]);
    }

    #[test]
    fn test_lookup_is_read_only() {
        let mut store = store();
        create(&mut store, "7", "Lionel Messi");
        assert!(store.lookup("Totally Unknown").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("lionel messi").unwrap().method, ResolutionMethod::NameIndex);
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let mut store = store();
        create(&mut store, "7", "Lionel Messi");
        store
            .get_mut("7")
            .unwrap()
            .links
            .insert("club".into(), "131".into());
        assert_eq!(store.get("7").unwrap().links["club"], "131");
        assert!(store.get_mut("missing").is_none());
    }
}
