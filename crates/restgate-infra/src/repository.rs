//! Credential store over the `users` document type.

use async_trait::async_trait;
use serde_json::Value;

use restgate_core::document::DocumentType;
use restgate_core::domain::User;
use restgate_core::error::StoreError;
use restgate_core::ports::{Document, Filter, UserRepository};

/// [`UserRepository`] reading and writing user documents.
pub struct DocumentUserRepository {
    users: DocumentType,
}

impl DocumentUserRepository {
    pub fn new(users: DocumentType) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for DocumentUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        tracing::debug!(login = %login, "Finding user by login");

        self.users
            .find_one(&Filter::all().eq("login", login))
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn set_refresh_token(
        &self,
        id: &str,
        refresh_token: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut changes = Document::new();
        changes.insert(
            "refreshToken".to_string(),
            Value::String(refresh_token.to_string()),
        );

        self.users
            .update_by_id(id, changes)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::InMemoryDocumentStore;
    use serde_json::json;

    async fn repository() -> DocumentUserRepository {
        let users = DocumentType::new("users", Arc::new(InMemoryDocumentStore::new()));
        users
            .create(
                json!({ "_id": "1", "login": "test", "password": "hash", "roles": ["USER"] })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();
        DocumentUserRepository::new(users)
    }

    #[tokio::test]
    async fn test_find_by_login() {
        let repo = repository().await;

        let user = repo.find_by_login("test").await.unwrap().unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.refresh_token, "");

        assert!(repo.find_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_refresh_token() {
        let repo = repository().await;

        let user = repo.set_refresh_token("1", "token").await.unwrap().unwrap();
        assert_eq!(user.refresh_token, "token");
        assert_eq!(user.login, "test");

        assert!(repo.set_refresh_token("2", "token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_user_document() {
        let repo = repository().await;
        repo.users
            .create(json!({ "login": 7 }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let malformed = repo
            .users
            .find_one(&Filter::all().eq("login", 7))
            .await
            .unwrap()
            .map(User::try_from)
            .unwrap();
        assert!(matches!(malformed, Err(StoreError::Malformed(_))));
    }
}
