//! Application services built on the ports.

mod auth;

pub use auth::{AuthService, AuthTokens};
