//! In-memory document store - used when no database is configured, and in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use restgate_core::error::StoreError;
use restgate_core::ports::{Document, DocumentStore, Filter, FindOptions, ID_FIELD};

use super::{References, compare_documents, effective_limit};

type Collection = Arc<RwLock<Vec<Document>>>;

/// Document store keeping every collection in a `Vec` behind its own lock.
///
/// Documents keep insertion order until a sort is requested.
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    references: References,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_references(references: References) -> Self {
        Self {
            collections: RwLock::default(),
            references,
        }
    }

    async fn collection(&self, name: &str) -> Collection {
        if let Some(existing) = self.collections.read().await.get(name) {
            return existing.clone();
        }

        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Vec<Document> {
        let collection = self.collection(collection).await;
        let documents = collection.read().await;

        let mut matched: Vec<&Document> = documents.iter().filter(|d| filter.matches(d)).collect();
        if !options.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &options.sort));
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = effective_limit(options).map_or(usize::MAX, |l| l as usize);

        matched.into_iter().skip(skip).take(limit).cloned().collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = self.select(collection, filter, options).await;
        self.references
            .populate(self, collection, &mut documents, &options.populate)
            .await?;
        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Option<Document>, StoreError> {
        let options = FindOptions {
            limit: Some(1),
            ..options.clone()
        };
        Ok(self.find(collection, filter, &options).await?.pop())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<Document, StoreError> {
        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::Validation(format!(
                    "{collection}.{ID_FIELD} should be a String, got {other}"
                )));
            }
            None => Uuid::new_v4().to_string(),
        };
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let collection_lock = self.collection(collection).await;
        let mut documents = collection_lock.write().await;

        if documents.iter().any(|d| d.get(ID_FIELD) == document.get(ID_FIELD)) {
            return Err(StoreError::Constraint(format!(
                "duplicate {ID_FIELD} '{id}' in {collection}"
            )));
        }

        tracing::debug!(collection = %collection, id = %id, "Inserting document");
        documents.push(document.clone());
        Ok(document)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        mut changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        changes.remove(ID_FIELD);

        let collection_lock = self.collection(collection).await;
        let mut documents = collection_lock.write().await;

        let Some(document) = documents.iter_mut().find(|d| filter.matches(d)) else {
            return Ok(None);
        };
        document.extend(changes);
        Ok(Some(document.clone()))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collection_lock = self.collection(collection).await;
        let mut documents = collection_lock.write().await;

        match documents.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restgate_core::document::{DocumentSchema, DocumentType, SaveKind};
    use restgate_core::ports::{Populate, SortField};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    async fn seeded(logins: &[&str]) -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        for (i, login) in logins.iter().enumerate() {
            store
                .insert("users", doc(json!({ "_id": i.to_string(), "login": login })))
                .await
                .unwrap();
        }
        store
    }

    fn logins(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .map(|d| d["login"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = InMemoryDocumentStore::new();

        let created = store
            .insert("users", doc(json!({ "login": "test" })))
            .await
            .unwrap();

        let id = created[ID_FIELD].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        let found = store
            .find_one("users", &Filter::by_id(id), &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = seeded(&["test"]).await;

        let result = store
            .insert("users", doc(json!({ "_id": "0", "login": "other" })))
            .await;

        assert!(matches!(result, Err(StoreError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_find_sorts_ascending_and_descending() {
        let store = seeded(&["test2", "test", "test3"]).await;

        let ascending = FindOptions {
            sort: vec![SortField::parse("login").unwrap()],
            ..FindOptions::default()
        };
        let descending = FindOptions {
            sort: vec![SortField::parse("-login").unwrap()],
            ..FindOptions::default()
        };

        let up = store.find("users", &Filter::all(), &ascending).await.unwrap();
        let down = store.find("users", &Filter::all(), &descending).await.unwrap();

        assert_eq!(logins(&up), vec!["test", "test2", "test3"]);
        assert_eq!(logins(&down), vec!["test3", "test2", "test"]);
    }

    #[tokio::test]
    async fn test_find_skip_and_limit() {
        let store = seeded(&["a", "b", "c", "d"]).await;

        let options = FindOptions {
            skip: Some(1),
            limit: Some(2),
            ..FindOptions::default()
        };
        let page = store.find("users", &Filter::all(), &options).await.unwrap();
        assert_eq!(logins(&page), vec!["b", "c"]);

        let unbounded = FindOptions {
            limit: Some(0),
            ..FindOptions::default()
        };
        let all = store.find("users", &Filter::all(), &unbounded).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_find_filters() {
        let store = seeded(&["a", "b"]).await;

        let found = store
            .find("users", &Filter::all().eq("login", "b"), &FindOptions::default())
            .await
            .unwrap();

        assert_eq!(logins(&found), vec!["b"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .insert("users", doc(json!({ "_id": "1", "login": "test", "roles": ["USER"] })))
            .await
            .unwrap();

        let updated = store
            .update_one(
                "users",
                &Filter::by_id("1"),
                doc(json!({ "_id": "2", "roles": ["ADMIN"] })),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["_id"], json!("1"));
        assert_eq!(updated["login"], json!("test"));
        assert_eq!(updated["roles"], json!(["ADMIN"]));

        let missing = store
            .update_one("users", &Filter::by_id("9"), doc(json!({ "login": "x" })))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_count() {
        let store = seeded(&["test"]).await;

        assert_eq!(store.delete_one("users", &Filter::by_id("0")).await.unwrap(), 1);
        assert_eq!(store.delete_one("users", &Filter::by_id("0")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_populate_declared_references() {
        let references = References::new()
            .declare("posts", "author", "users")
            .declare("posts", "readers", "users");
        let store = InMemoryDocumentStore::with_references(references);
        store
            .insert("users", doc(json!({ "_id": "u1", "login": "test" })))
            .await
            .unwrap();
        store
            .insert(
                "posts",
                doc(json!({ "_id": "p1", "author": "u1", "readers": ["u1", "ghost"] })),
            )
            .await
            .unwrap();

        let plain = store
            .find_one("posts", &Filter::by_id("p1"), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plain["author"], json!("u1"));

        let options = FindOptions {
            populate: Populate::Fields(vec!["author".to_string()]),
            ..FindOptions::default()
        };
        let populated = store
            .find_one("posts", &Filter::by_id("p1"), &options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(populated["author"]["login"], json!("test"));
        assert_eq!(populated["readers"], json!(["u1", "ghost"]));

        let options = FindOptions {
            populate: Populate::All,
            ..FindOptions::default()
        };
        let populated = store
            .find_one("posts", &Filter::by_id("p1"), &options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(populated["readers"].as_array().unwrap().len(), 1);
    }

    struct LoginSchema;

    impl DocumentSchema for LoginSchema {
        fn prepare(&self, document: &mut Document, kind: SaveKind) -> Result<(), StoreError> {
            if kind == SaveKind::Create && !document.contains_key("login") {
                return Err(StoreError::Validation("Key users.login is required".into()));
            }
            Ok(())
        }

        fn unique_fields(&self) -> &[&'static str] {
            &["login"]
        }
    }

    #[tokio::test]
    async fn test_document_type_enforces_schema() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let users = DocumentType::new("users", store).with_schema(Arc::new(LoginSchema));

        let created = users.create(doc(json!({ "login": "test" }))).await.unwrap();
        let id = created["_id"].as_str().unwrap().to_string();

        let duplicate = users.create(doc(json!({ "login": "test" }))).await;
        assert!(matches!(duplicate, Err(StoreError::Constraint(_))));

        let missing = users.create(doc(json!({ "roles": ["USER"] }))).await;
        assert!(matches!(missing, Err(StoreError::Validation(_))));

        // Re-saving its own login is not a duplicate.
        let updated = users
            .update_by_id(&id, doc(json!({ "login": "test", "age": 3 })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["age"], json!(3));

        users.create(doc(json!({ "login": "other" }))).await.unwrap();
        let clash = users.update_by_id(&id, doc(json!({ "login": "other" }))).await;
        assert!(matches!(clash, Err(StoreError::Constraint(_))));
    }
}
