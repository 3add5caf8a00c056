//! Middleware modules.

pub mod auth;
pub mod error;

pub use auth::{Identity, RequiresLogin, RequiresRole};
pub use error::{ApiErrorHandler, AppError, AppResult};
