//! Domain entities - the core business objects.

pub mod roles;
mod user;

pub use user::{Principal, User, UserSchema};
