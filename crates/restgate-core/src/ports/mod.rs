//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod repository;
mod store;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use repository::UserRepository;
pub use store::{Document, DocumentStore, Filter, FindOptions, ID_FIELD, Populate, SortField};
