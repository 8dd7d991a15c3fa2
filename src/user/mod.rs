pub mod auth;
mod sqlite_user_store;
pub mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, CredentialHasher, UserAuthCredentials, UsernamePasswordCredentials};
pub use sqlite_user_store::SqliteUserStore;
pub use user_models::{ContentKind, Favorite, MusicAuthRecord, Rating, RATING_MAX, RATING_MIN};
pub use user_store::{UserAuthCredentialsStore, UserAuthTokenStore, UserStore};
