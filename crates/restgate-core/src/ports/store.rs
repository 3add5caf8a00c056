//! Document store port - abstraction over schemaless collections.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned document id.
pub const ID_FIELD: &str = "_id";

/// Conjunction of field equality conditions. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().eq(ID_FIELD, Value::String(id.into()))
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

/// Which reference fields to resolve into their target documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Populate {
    #[default]
    None,
    All,
    Fields(Vec<String>),
}

impl Populate {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            Populate::None => false,
            Populate::All => true,
            Populate::Fields(fields) => fields.iter().any(|f| f == field),
        }
    }
}

/// One sort key; `-field` sorts descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub descending: bool,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        if field.is_empty() {
            return None;
        }

        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// Options of a find query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub populate: Populate,
    pub sort: Vec<SortField>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl FindOptions {
    /// Drop everything but `populate`.
    pub fn populate_only(self) -> Self {
        Self {
            populate: self.populate,
            ..Self::default()
        }
    }
}

/// Document store trait - abstraction over storage backends (in-memory, Postgres).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of `collection` matching `filter`, sorted then paged.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// First document matching `filter`.
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Option<Document>, StoreError>;

    /// Persist a new document, assigning `_id` when absent.
    async fn insert(&self, collection: &str, document: Document) -> Result<Document, StoreError>;

    /// Merge `changes` into the first matching document. `_id` is never changed.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        changes: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Delete the first matching document and return how many were removed.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(
            SortField::parse("-login"),
            Some(SortField {
                field: "login".to_string(),
                descending: true
            })
        );
        assert_eq!(
            SortField::parse("login"),
            Some(SortField {
                field: "login".to_string(),
                descending: false
            })
        );
        assert_eq!(SortField::parse("-"), None);
        assert_eq!(SortField::parse(""), None);
    }

    #[test]
    fn test_filter_matches() {
        let doc = json!({ "_id": "1", "login": "test" });
        let doc = doc.as_object().unwrap();

        assert!(Filter::all().matches(doc));
        assert!(Filter::by_id("1").matches(doc));
        assert!(Filter::by_id("1").eq("login", "test").matches(doc));
        assert!(!Filter::by_id("2").matches(doc));
    }

    #[test]
    fn test_populate_only_drops_paging() {
        let options = FindOptions {
            populate: Populate::All,
            sort: vec![SortField::parse("login").unwrap()],
            limit: Some(1),
            skip: Some(2),
        };

        let options = options.populate_only();

        assert_eq!(options.populate, Populate::All);
        assert!(options.sort.is_empty());
        assert_eq!(options.limit, None);
        assert_eq!(options.skip, None);
    }
}
