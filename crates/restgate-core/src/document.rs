//! Document types - a named collection bound to a store and an optional schema.

use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;
use crate::ports::{Document, DocumentStore, Filter, FindOptions, ID_FIELD};

/// Which write a schema is preparing a document for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Create,
    Update,
}

/// Hook run before a document is written.
pub trait DocumentSchema: Send + Sync {
    /// Validate and normalize `document` in place. For updates only the
    /// changed fields are present.
    fn prepare(&self, document: &mut Document, kind: SaveKind) -> Result<(), StoreError>;

    /// Fields whose values must be unique across the collection.
    fn unique_fields(&self) -> &[&'static str] {
        &[]
    }
}

/// Handle on one collection of a document store.
#[derive(Clone)]
pub struct DocumentType {
    collection: String,
    store: Arc<dyn DocumentStore>,
    schema: Option<Arc<dyn DocumentSchema>>,
}

impl DocumentType {
    pub fn new(collection: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: collection.into(),
            store,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Arc<dyn DocumentSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn find(&self, options: &FindOptions) -> Result<Vec<Document>, StoreError> {
        self.store
            .find(&self.collection, &Filter::all(), options)
            .await
    }

    pub async fn find_by_id(
        &self,
        id: &str,
        options: &FindOptions,
    ) -> Result<Option<Document>, StoreError> {
        self.store
            .find_one(&self.collection, &Filter::by_id(id), options)
            .await
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.store
            .find_one(&self.collection, filter, &FindOptions::default())
            .await
    }

    pub async fn create(&self, mut document: Document) -> Result<Document, StoreError> {
        if let Some(schema) = &self.schema {
            schema.prepare(&mut document, SaveKind::Create)?;
            self.check_unique(schema.as_ref(), &document, None).await?;
        }

        self.store.insert(&self.collection, document).await
    }

    /// Apply `changes` to document `id`. Returns `None` if it does not exist.
    pub async fn update_by_id(
        &self,
        id: &str,
        mut changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        changes.remove(ID_FIELD);

        if let Some(schema) = &self.schema {
            schema.prepare(&mut changes, SaveKind::Update)?;
            self.check_unique(schema.as_ref(), &changes, Some(id)).await?;
        }

        self.store
            .update_one(&self.collection, &Filter::by_id(id), changes)
            .await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<u64, StoreError> {
        self.store
            .delete_one(&self.collection, &Filter::by_id(id))
            .await
    }

    async fn check_unique(
        &self,
        schema: &dyn DocumentSchema,
        document: &Document,
        own_id: Option<&str>,
    ) -> Result<(), StoreError> {
        for field in schema.unique_fields() {
            let Some(value) = document.get(*field) else {
                continue;
            };

            if let Some(existing) = self.find_one(&Filter::all().eq(*field, value.clone())).await? {
                let existing_id = existing.get(ID_FIELD).and_then(Value::as_str);
                if own_id.is_none() || existing_id != own_id {
                    return Err(StoreError::Constraint(format!(
                        "duplicate value for unique key {}.{field}",
                        self.collection
                    )));
                }
            }
        }

        Ok(())
    }
}
