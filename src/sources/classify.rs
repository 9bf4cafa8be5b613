// src/sources/classify.rs
use crate::models::core::SourceKind;

const PLAYER_FILE_KEYWORDS: &[&str] = &["player", "players", "player_profiles"];
const TEAM_FILE_KEYWORDS: &[&str] = &["club", "team_details", "teams", "club_profiles"];
const COMPETITION_FILE_KEYWORDS: &[&str] = &["competition", "competitions", "team_competitions"];
const INJURY_FILE_KEYWORDS: &[&str] = &["injury", "injuries", "player_injuries"];

fn any_in(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

/// Guesses which dataset a CSV belongs to from its file name and header row.
///
/// Rules run in order and later rules override earlier ones, so the most
/// specific dataset (injuries) wins over the generic player match. Headers
/// naming a player force `Players` unless the file name says it is a team or
/// injury file.
pub fn classify<S: AsRef<str>>(file_name: &str, headers: &[S]) -> SourceKind {
    let name = file_name.to_lowercase();
    let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_lowercase()).collect();
    let header_has = |needle: &str| headers.iter().any(|h| h.contains(needle));

    let mut kind = SourceKind::Unknown;

    if any_in(&name, PLAYER_FILE_KEYWORDS) || header_has("player") {
        kind = SourceKind::Players;
    }
    if (any_in(&name, TEAM_FILE_KEYWORDS) || header_has("club") || header_has("team"))
        && (name.contains("team_details") || name.contains("club") || name.contains("team"))
    {
        kind = SourceKind::Teams;
    }
    if any_in(&name, COMPETITION_FILE_KEYWORDS) || header_has("competition") {
        kind = SourceKind::Competitions;
    }
    if any_in(&name, INJURY_FILE_KEYWORDS) || header_has("injury") {
        kind = SourceKind::Injuries;
    }

    let names_player = header_has("player_id") || header_has("player_name");
    if names_player && !name.contains("team") && !any_in(&name, INJURY_FILE_KEYWORDS) {
        kind = SourceKind::Players;
    }
    kind
}
