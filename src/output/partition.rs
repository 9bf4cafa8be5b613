// src/output/partition.rs
use std::collections::HashMap;

use crate::enrichment::club_link::CLUB_LINK;
use crate::entity_identification::store::CanonicalRecordStore;
use crate::models::core::{CanonicalEntity, Field};

pub const UNKNOWN_POSITION: &str = "Unknown";
pub const UNKNOWN_CLUB: &str = "Unknown Club";

/// Attribute the player documents are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    League,
    Country,
    Position,
    Club,
}

impl PartitionKey {
    pub const ALL: [PartitionKey; 4] = [
        PartitionKey::League,
        PartitionKey::Country,
        PartitionKey::Position,
        PartitionKey::Club,
    ];

    /// Value of the `category` field in group payloads.
    pub fn category(&self) -> &'static str {
        match self {
            PartitionKey::League => "league",
            PartitionKey::Country => "country",
            PartitionKey::Position => "position",
            PartitionKey::Club => "club",
        }
    }

    /// Output sub-directory of the group files.
    pub fn folder(&self) -> &'static str {
        match self {
            PartitionKey::League => "leagues",
            PartitionKey::Country => "countries",
            PartitionKey::Position => "positions",
            PartitionKey::Club => "clubs",
        }
    }

    /// Group a player falls in. `None` leaves the player out of this
    /// partition; position and club always yield a group.
    pub fn key_for(&self, player: &CanonicalEntity, club: Option<&CanonicalEntity>) -> Option<String> {
        let from_club = |field: Field| club.and_then(|c| c.field_text(field));
        let value = match self {
            PartitionKey::League => player.field_text(Field::League).or_else(|| from_club(Field::Competition)),
            PartitionKey::Country => player
                .field_text(Field::NationalTeam)
                .or_else(|| from_club(Field::Country)),
            PartitionKey::Position => Some(player.field_text(Field::Position).unwrap_or(UNKNOWN_POSITION)),
            PartitionKey::Club => Some(
                player
                    .field_text(Field::Club)
                    .or_else(|| club.map(|c| c.canonical_name.as_str()).filter(|n| !n.is_empty()))
                    .unwrap_or(UNKNOWN_CLUB),
            ),
        };
        value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    }
}

pub fn linked_club<'c>(player: &CanonicalEntity, clubs: &'c CanonicalRecordStore) -> Option<&'c CanonicalEntity> {
    player.links.get(CLUB_LINK).and_then(|id| clubs.get(id))
}

#[derive(Debug)]
pub struct Group<'a> {
    pub name: String,
    pub members: Vec<&'a CanonicalEntity>,
}

/// Groups players by `key`. Groups appear in order of first member; members
/// keep the store's creation order.
pub fn partition<'a>(
    players: &'a CanonicalRecordStore,
    clubs: &CanonicalRecordStore,
    key: PartitionKey,
) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for player in players.all() {
        let Some(name) = key.key_for(player, linked_club(player, clubs)) else {
            continue;
        };
        let slot = *positions.entry(name.clone()).or_insert_with(|| {
            groups.push(Group {
                name,
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(player);
    }
    groups
}
