pub mod club_link;

pub use club_link::{link_players_to_clubs, CLUB_LINK};
