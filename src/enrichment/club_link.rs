// src/enrichment/club_link.rs
use log::debug;

use crate::entity_identification::store::CanonicalRecordStore;
use crate::models::core::Field;
use crate::models::stats_models::LinkStats;

/// Relation name under which a player's club id is stored.
pub const CLUB_LINK: &str = "club";

/// Points every player at a club in `clubs`: a `club_id` naming a known club
/// wins, otherwise the `club` name is resolved through the club store.
pub fn link_players_to_clubs(
    players: &mut CanonicalRecordStore,
    clubs: &CanonicalRecordStore,
) -> LinkStats {
    let mut stats = LinkStats::default();

    for player in players.entities_mut() {
        stats.players_considered += 1;

        let by_id = player
            .field_text(Field::ClubId)
            .map(str::trim)
            .filter(|id| clubs.get(id).is_some())
            .map(str::to_string);
        if let Some(club_id) = by_id {
            player.links.insert(CLUB_LINK.to_string(), club_id);
            stats.linked_by_id += 1;
            continue;
        }

        let Some(club_name) = player.field_text(Field::Club) else {
            continue;
        };
        match clubs.lookup(club_name) {
            Some(resolution) => {
                debug!(
                    "Club link: {} '{}' -> {} via {}",
                    player.entity_id,
                    club_name,
                    resolution.entity_id,
                    resolution.method.label()
                );
                player.links.insert(CLUB_LINK.to_string(), resolution.entity_id);
                stats.linked_by_name += 1;
            }
            None => {
                debug!("Club link: {} '{}' unresolved", player.entity_id, club_name);
                stats.unresolved += 1;
            }
        }
    }
    stats
}
