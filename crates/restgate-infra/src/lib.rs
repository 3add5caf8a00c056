//! # Restgate Infrastructure
//!
//! Concrete implementations of the ports defined in `restgate-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory store only
//! - `postgres` - PostgreSQL document store via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod database;
pub mod repository;
pub mod store;

#[cfg(feature = "auth")]
pub mod auth;

pub use database::DatabaseConfig;
pub use repository::DocumentUserRepository;
pub use store::{InMemoryDocumentStore, References};

#[cfg(feature = "postgres")]
pub use store::PostgresDocumentStore;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
