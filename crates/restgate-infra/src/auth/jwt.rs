//! JWT token service implementation.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use restgate_core::ports::{AuthError, TokenClaims, TokenService};

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_ttl: Duration::from_secs(15 * 60),
        }
    }
}

/// Wire claims of an access token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    login: String,
    roles: Vec<String>,
    iat: i64,
    exp: i64,
}

/// HS256 access tokens signed with a shared secret.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let ttl = TimeDelta::from_std(config.access_token_ttl).unwrap_or(TimeDelta::MAX);

        Self {
            encoding_key,
            decoding_key,
            validation,
            ttl,
        }
    }

    /// Sign a token as if issued at `now`.
    pub fn issue_at(
        &self,
        login: &str,
        roles: &[String],
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            login: login.to_string(),
            roles: roles.to_vec(),
            iat,
            exp: iat.saturating_add(self.ttl.num_seconds()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, login: &str, roles: &[String]) -> Result<String, AuthError> {
        self.issue_at(login, roles, Utc::now())
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        let claims = token_data.claims;
        Ok(TokenClaims {
            login: claims.login,
            roles: claims.roles,
            iat: claims.iat,
            exp: claims.exp,
        })
    }
}
