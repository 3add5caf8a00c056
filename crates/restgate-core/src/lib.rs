//! # Restgate Core
//!
//! Domain layer of the restgate backend: the error model, the user entity,
//! the document store ports and the declarative resource protection model.
//! Infrastructure lives behind the traits in [`ports`].

pub mod document;
pub mod domain;
pub mod error;
pub mod ports;
pub mod resource;
pub mod services;

pub use error::{ApiError, ErrorKind, StoreError};
