//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use restgate_infra::DatabaseConfig;

const DEFAULT_TOKEN_SECRET: &str = "change-me-in-production";
const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Credentials of the administrator created at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub login: String,
    pub password: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub token_secret: String,
    pub access_token_ttl: Duration,
    /// Lowercase name of the header carrying the refresh token.
    pub refresh_token_header: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            token_secret: DEFAULT_TOKEN_SECRET.to_string(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_header: "refresh".to_string(),
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        });

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_LOGIN"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(login), Ok(password)) if !login.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { login, password })
            }
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database,
            token_secret: Self::token_secret(),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .ok()
                .map_or(defaults.access_token_ttl, |raw| parse_ttl(&raw)),
            refresh_token_header: env::var("REFRESH_TOKEN_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or(defaults.refresh_token_header),
            bootstrap_admin,
        }
    }

    fn token_secret() -> String {
        let secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| DEFAULT_TOKEN_SECRET.to_string());

        // Warn if using default secret in production
        if secret == DEFAULT_TOKEN_SECRET {
            let is_production = env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default token secret in production! Set TOKEN_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default token secret. Set TOKEN_SECRET for production use.");
            }
        }

        secret
    }
}

/// Parse a humantime duration such as `15m` or `1h 30m`.
fn parse_ttl(raw: &str) -> Duration {
    match humantime::parse_duration(raw) {
        Ok(ttl) if !ttl.is_zero() => ttl,
        _ => {
            tracing::warn!(value = %raw, "Invalid ACCESS_TOKEN_TTL, using 15m");
            DEFAULT_ACCESS_TOKEN_TTL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("15m"), Duration::from_secs(900));
        assert_eq!(parse_ttl("1h 30m"), Duration::from_secs(5400));
        assert_eq!(parse_ttl("soon"), DEFAULT_ACCESS_TOKEN_TTL);
        assert_eq!(parse_ttl("0s"), DEFAULT_ACCESS_TOKEN_TTL);
    }
}
