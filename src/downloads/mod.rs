mod extractor;
pub mod models;
mod schema;
mod store;

pub use extractor::{ExtractorError, HttpExtractorClient, VideoExtractor};
pub use models::{DownloadRequest, DownloadedFile, VideoMetadata};
pub use store::{DownloadStore, SqliteDownloadStore};
