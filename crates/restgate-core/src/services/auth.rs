//! Token service - login, access token refresh and bearer authentication.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Principal, User};
use crate::error::ApiError;
use crate::ports::{PasswordService, TokenService, UserRepository};

/// Tokens handed out on a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues access tokens and validates refresh tokens against the credential store.
///
/// Refresh tokens rotate on login only. A refresh reuses the stored token, so
/// a leaked refresh token stays usable until the next login of its owner.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            users,
            tokens,
            passwords,
        }
    }

    /// Sign an access token carrying the user's login and roles.
    pub fn issue_access_token(&self, user: &User) -> Result<String, ApiError> {
        tracing::debug!(login = %user.login, "Generating access token");
        Ok(self.tokens.generate_token(&user.login, &user.roles)?)
    }

    /// Check credentials and rotate the user's refresh token.
    pub async fn login(&self, login: &str, password: &str) -> Result<AuthTokens, ApiError> {
        tracing::debug!(login = %login, "Trying to log in user");

        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(ApiError::bad_login)?;

        if !self.passwords.verify(password, &user.password)? {
            return Err(ApiError::bad_password());
        }

        tracing::debug!(login = %login, "Creating new refresh token");
        let refresh_token = Uuid::new_v4().to_string();
        let updated = self
            .users
            .set_refresh_token(&user.id, &refresh_token)
            .await?
            .ok_or_else(ApiError::bad_login)?;

        Ok(AuthTokens {
            access_token: self.issue_access_token(&updated)?,
            refresh_token: updated.refresh_token,
        })
    }

    /// Mint a new access token if `presented` matches the stored refresh token.
    pub async fn refresh(&self, login: &str, presented: Option<&str>) -> Result<String, ApiError> {
        let presented = match presented {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ApiError::missing_refresh_token()),
        };

        tracing::debug!(login = %login, "Trying to refresh access token");

        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(ApiError::refresh_subject_not_found)?;

        if user.refresh_token != presented {
            return Err(ApiError::refresh_not_allowed());
        }

        self.issue_access_token(&user)
    }

    /// Resolve the principal behind a bearer token.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Principal, ApiError> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ApiError::no_token()),
        };

        let claims = self.tokens.validate_token(token)?;

        let user = self
            .users
            .find_by_login(&claims.login)
            .await?
            .ok_or_else(ApiError::token_subject_not_found)?;

        Ok(Principal::from(&user))
    }
}
