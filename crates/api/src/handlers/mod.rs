pub mod entries;
pub mod playlists;
