use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{DocumentSchema, SaveKind};
use crate::error::StoreError;
use crate::ports::{Document, PasswordService};

use super::roles;

fn default_roles() -> Vec<String> {
    vec![roles::USER.to_string()]
}

/// User entity - the stored principal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub login: String,
    /// Argon2 PHC string.
    pub password: String,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
}

impl TryFrom<Document> for User {
    type Error = StoreError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(document))
            .map_err(|e| StoreError::Malformed(format!("user document: {e}")))
    }
}

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub login: String,
    pub roles: Vec<String>,
}

impl Principal {
    /// Check if the principal has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True if at least one of `required` is held. Case-sensitive.
    pub fn has_any_role(&self, required: &[String]) -> bool {
        required.iter().any(|role| self.has_role(role))
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            login: user.login.clone(),
            roles: user.roles.clone(),
        }
    }
}

/// Schema of the `users` collection.
///
/// Applies defaults, checks field types and hashes any plain password before
/// the document reaches the store.
pub struct UserSchema {
    passwords: Arc<dyn PasswordService>,
}

impl UserSchema {
    pub fn new(passwords: Arc<dyn PasswordService>) -> Self {
        Self { passwords }
    }

    fn check_string(document: &Document, field: &str) -> Result<(), StoreError> {
        match document.get(field) {
            None | Some(Value::String(_)) => Ok(()),
            Some(other) => Err(StoreError::Validation(format!(
                "Value assigned to users.{field} should be String, got {other}"
            ))),
        }
    }

    fn check_roles(document: &Document) -> Result<(), StoreError> {
        match document.get("roles") {
            None => Ok(()),
            Some(Value::Array(items))
                if !items.is_empty() && items.iter().all(Value::is_string) =>
            {
                Ok(())
            }
            Some(other) => Err(StoreError::Validation(format!(
                "Value assigned to users.roles should be a non empty [String], got {other}"
            ))),
        }
    }

    fn require(document: &Document, field: &str) -> Result<(), StoreError> {
        match document.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Ok(()),
            Some(Value::String(_)) | None | Some(Value::Null) => Err(StoreError::Validation(
                format!("Key users.{field} is required"),
            )),
            Some(_) => Self::check_string(document, field),
        }
    }
}

impl DocumentSchema for UserSchema {
    fn prepare(&self, document: &mut Document, kind: SaveKind) -> Result<(), StoreError> {
        if kind == SaveKind::Create {
            Self::require(document, "login")?;
            Self::require(document, "password")?;
            document
                .entry("roles")
                .or_insert_with(|| Value::from(default_roles()));
            document
                .entry("refreshToken")
                .or_insert_with(|| Value::String(String::new()));
        }

        Self::check_string(document, "login")?;
        Self::check_string(document, "password")?;
        Self::check_string(document, "refreshToken")?;
        Self::check_roles(document)?;

        if let Some(Value::String(plain)) = document.get("password") {
            let hash = self
                .passwords
                .hash(plain)
                .map_err(|e| StoreError::Validation(format!("password hashing failed: {e}")))?;
            document.insert("password".to_string(), Value::String(hash));
        }

        Ok(())
    }

    fn unique_fields(&self) -> &[&'static str] {
        &["login"]
    }
}
