pub mod models;
pub mod schema;
mod store;
mod trait_def;

pub use models::{Album, AlbumEntry, AlbumKind, Artist, ResolvedAlbum, ResolvedArtist, Song, SongRole};
pub use store::SqliteLibraryStore;
pub use trait_def::LibraryStore;
