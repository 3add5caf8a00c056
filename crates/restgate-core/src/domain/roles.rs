//! Role names known to the application.

pub const ADMIN: &str = "ADMIN";
pub const USER: &str = "USER";
