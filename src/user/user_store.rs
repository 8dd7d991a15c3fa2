use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use super::user_models::{ContentKind, Favorite, MusicAuthRecord, Rating};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Creates or replaces the user's password credentials.
    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns a user's authentication token given the token value.
    /// Returns Ok(None) if the token does not exist.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token. Returns Ok(None) if the token did not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Stamps the token with the current time.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    fn get_all_user_handles(&self) -> Result<Vec<String>>;

    // =========================================================================
    // Ratings
    // =========================================================================

    /// Creates or updates the user's rating of one entity. Rejects values
    /// outside [RATING_MIN, RATING_MAX] without touching the database.
    fn set_rating(
        &self,
        user_id: usize,
        kind: ContentKind,
        content_id: &str,
        value: i32,
        recommended: bool,
    ) -> Result<()>;

    fn get_rating(
        &self,
        user_id: usize,
        kind: ContentKind,
        content_id: &str,
    ) -> Result<Option<Rating>>;

    /// Removes a rating; Ok even if there was none.
    fn delete_rating(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<()>;

    /// The user's ratings, optionally restricted to one kind, newest update
    /// first.
    fn list_ratings(&self, user_id: usize, kind: Option<ContentKind>) -> Result<Vec<Rating>>;

    /// Mean rating of one entity across all users, None when unrated.
    fn average_rating(&self, kind: ContentKind, content_id: &str) -> Result<Option<f64>>;

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Marks an entity as favorite. Idempotent.
    fn add_favorite(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<()>;

    /// Removes a favorite; Ok even if there was none.
    fn remove_favorite(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<()>;

    fn is_favorite(&self, user_id: usize, kind: ContentKind, content_id: &str) -> Result<bool>;

    /// The user's favorites, optionally restricted to one kind, most recent
    /// first.
    fn list_favorites(&self, user_id: usize, kind: Option<ContentKind>) -> Result<Vec<Favorite>>;

    // =========================================================================
    // Music service credentials
    // =========================================================================

    /// Registers (or replaces) the path of the user's credentials file.
    fn set_music_auth(&self, user_id: usize, auth_file: &str) -> Result<()>;

    /// Returns Ok(None) when the user never registered credentials.
    fn get_music_auth(&self, user_id: usize) -> Result<Option<MusicAuthRecord>>;
}
