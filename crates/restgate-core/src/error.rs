//! Error model shared by every layer.
//!
//! [`ApiError`] is the single failure type that reaches HTTP clients. Each
//! [`ErrorKind`] fixes the HTTP status; the code and message default per kind
//! but some kinds (internal, unauthorized) accept a custom pair.

use std::borrow::Cow;

use thiserror::Error;

const UNKNOWN_ERROR_MESSAGE: &str = "An unknown server error occured while processing request";
const USER_NOT_FOUND_MESSAGE: &str = "No user found for login in JWT Token";

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Internal,
    NotFound,
    NotFoundResource,
    Unauthorized,
    Forbidden,
    TokenExpired,
    NoToken,
    InvalidTokenSignature,
}

impl ErrorKind {
    /// HTTP status code sent for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Internal => 500,
            ErrorKind::NotFound | ErrorKind::NotFoundResource => 404,
            ErrorKind::Unauthorized
            | ErrorKind::TokenExpired
            | ErrorKind::NoToken
            | ErrorKind::InvalidTokenSignature => 401,
            ErrorKind::Forbidden => 403,
        }
    }
}

/// Typed API failure carrying a stable machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    code: Cow<'static, str>,
    message: String,
}

impl ApiError {
    fn new(kind: ErrorKind, code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Generic server error with the default message.
    pub fn unknown() -> Self {
        Self::internal(UNKNOWN_ERROR_MESSAGE)
    }

    /// Generic server error preserving `message`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "INTERNAL_SERVER_ERROR", message)
    }

    /// Server error with a custom code.
    pub fn internal_with_code(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, code, message)
    }

    /// No route matched the request.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, "NOT_FOUND", "Not Found")
    }

    /// No document matched the requested id.
    pub fn not_found_resource(id: &str) -> Self {
        Self::new(
            ErrorKind::NotFoundResource,
            "RESOURCE_NOT_FOUND",
            format!("Resource with id '{id}' not found"),
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "UNAUTHORIZED", "Unauthorized")
    }

    pub fn unauthorized_with(code: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, code, message)
    }

    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden, "FORBIDDEN_OPERATION", "Forbidden")
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorKind::TokenExpired, "TOKEN_EXPIRED", "Jwt token has expired")
    }

    pub fn no_token() -> Self {
        Self::new(
            ErrorKind::NoToken,
            "NO_TOKEN_FOUND",
            "No Jwt token found in authorization header",
        )
    }

    pub fn invalid_token_signature() -> Self {
        Self::new(
            ErrorKind::InvalidTokenSignature,
            "INVALID_TOKEN_SIGNATURE",
            "Jwt token signature is invalid",
        )
    }

    pub fn bad_login() -> Self {
        Self::unauthorized_with("BAD_LOGIN", "Bad login")
    }

    pub fn bad_password() -> Self {
        Self::unauthorized_with("BAD_PASSWORD", "Bad password")
    }

    pub fn missing_refresh_token() -> Self {
        Self::unauthorized_with("MISSING_REFRESH_TOKEN", "Refresh token's missing")
    }

    pub fn refresh_not_allowed() -> Self {
        Self::unauthorized_with("REFRESH_NOT_ALLOWED", "Refresh token has been revoked")
    }

    /// The subject of an authenticated request no longer exists.
    pub fn token_subject_not_found() -> Self {
        Self::unauthorized_with("USER_NOT_FOUND", USER_NOT_FOUND_MESSAGE)
    }

    /// The subject of a refresh request no longer exists.
    ///
    /// Reported as a server error: the login came from a token that passed
    /// authentication moments earlier.
    pub fn refresh_subject_not_found() -> Self {
        Self::internal_with_code("USER_NOT_FOUND", USER_NOT_FOUND_MESSAGE)
    }

    /// Converts any error into an `ApiError`, keeping `ApiError`s untouched.
    pub fn handle<E>(err: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let any: &dyn std::any::Any = &err;
        match any.downcast_ref::<ApiError>() {
            Some(api) => api.clone(),
            None => Self::internal(err.to_string()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl Default for ApiError {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Document store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(err.to_string())
    }
}
