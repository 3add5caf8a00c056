use async_trait::async_trait;

use crate::domain::User;
use crate::error::StoreError;

/// Credential store - user lookups needed by authentication.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by login.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;

    /// Overwrite the stored refresh token of user `id`.
    ///
    /// Returns the updated user, `None` if it no longer exists.
    async fn set_refresh_token(
        &self,
        id: &str,
        refresh_token: &str,
    ) -> Result<Option<User>, StoreError>;
}
