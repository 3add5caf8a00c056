//! Authentication ports.

use crate::error::ApiError;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub login: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Access token signing and verification.
pub trait TokenService: Send + Sync {
    /// Sign an access token for `login` carrying `roles`.
    fn generate_token(&self, login: &str, roles: &[String]) -> Result<String, AuthError>;

    /// Verify signature and expiry, then decode the claims.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::token_expired(),
            AuthError::InvalidSignature | AuthError::InvalidToken(_) => {
                ApiError::invalid_token_signature()
            }
            AuthError::Signing(_) | AuthError::HashingError(_) => ApiError::internal(err.to_string()),
        }
    }
}
