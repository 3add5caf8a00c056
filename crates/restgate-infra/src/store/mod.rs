//! Document store implementations.
//!
//! Both stores share the reference table used to resolve `populate` requests:
//! a populated field holding a document id (or an array of ids) is replaced by
//! the referenced document(s) of the declared target collection.

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use restgate_core::error::StoreError;
use restgate_core::ports::{Document, DocumentStore, Filter, FindOptions, Populate, SortField};

pub use memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;

/// Declared references between collections, `collection.field -> target`.
#[derive(Debug, Clone, Default)]
pub struct References {
    by_collection: HashMap<String, Vec<(String, String)>>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `collection.field` holds ids of documents in `target`.
    pub fn declare(
        mut self,
        collection: impl Into<String>,
        field: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.by_collection
            .entry(collection.into())
            .or_default()
            .push((field.into(), target.into()));
        self
    }

    /// References of `collection` selected by `populate`.
    fn selected<'a>(&'a self, collection: &str, populate: &Populate) -> Vec<(&'a str, &'a str)> {
        self.by_collection
            .get(collection)
            .map(|refs| {
                refs.iter()
                    .filter(|(field, _)| populate.includes(field))
                    .map(|(field, target)| (field.as_str(), target.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace referenced ids in `documents` by the documents they point to.
    ///
    /// Unknown single references become `null`, unknown array entries are dropped.
    pub(crate) async fn populate(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        documents: &mut [Document],
        populate: &Populate,
    ) -> Result<(), StoreError> {
        let selected = self.selected(collection, populate);
        if selected.is_empty() {
            return Ok(());
        }

        for document in documents.iter_mut() {
            for (field, target) in &selected {
                let Some(value) = document.get_mut(*field) else {
                    continue;
                };

                match value {
                    Value::String(id) => {
                        let resolved = fetch(store, target, id).await?;
                        *value = resolved.map(Value::Object).unwrap_or(Value::Null);
                    }
                    Value::Array(items) => {
                        let mut resolved = Vec::with_capacity(items.len());
                        for id in items.iter().filter_map(Value::as_str) {
                            if let Some(found) = fetch(store, target, id).await? {
                                resolved.push(Value::Object(found));
                            }
                        }
                        *items = resolved;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

async fn fetch(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<Option<Document>, StoreError> {
    store
        .find_one(collection, &Filter::by_id(id), &FindOptions::default())
        .await
}

/// Rank of a JSON type in sort order: missing and null first, then booleans,
/// numbers, strings, arrays and objects.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Stable multi-key ordering of documents.
pub(crate) fn compare_documents(a: &Document, b: &Document, sort: &[SortField]) -> Ordering {
    for key in sort {
        let ordering = compare_values(a.get(&key.field), b.get(&key.field));
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// A limit of zero means no limit.
pub(crate) fn effective_limit(options: &FindOptions) -> Option<u64> {
    options.limit.filter(|&limit| limit > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    #[test]
    fn test_compare_values_orders_types() {
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&json!(99)), Some(&json!("1"))),
            Ordering::Less
        );
    }

    #[test]
    fn test_compare_documents_multi_key() {
        let a = doc(json!({ "group": 1, "login": "b" }));
        let b = doc(json!({ "group": 1, "login": "a" }));
        let sort = vec![
            SortField::parse("group").unwrap(),
            SortField::parse("-login").unwrap(),
        ];

        assert_eq!(compare_documents(&a, &b, &sort), Ordering::Less);
    }

    #[test]
    fn test_effective_limit_zero_is_unbounded() {
        let options = FindOptions {
            limit: Some(0),
            ..FindOptions::default()
        };
        assert_eq!(effective_limit(&options), None);
    }
}
