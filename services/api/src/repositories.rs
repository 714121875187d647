//! Repositories for database operations

pub mod notes;
pub mod playlist;

pub use notes::{NoteRepository, NoteStore};
pub use playlist::{CreatePlaylistError, PlaylistRepository, PlaylistStore};
