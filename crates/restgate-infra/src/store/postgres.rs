//! PostgreSQL document store - every collection lives in the `documents` JSONB table.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, Order,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use restgate_core::error::StoreError;
use restgate_core::ports::{Document, DocumentStore, Filter, FindOptions, ID_FIELD};

use super::{References, effective_limit};
use crate::database::entity::document::{self, Entity as DocumentEntity};

/// Document store backed by a single `documents (id, collection, body)` table.
///
/// `_id` is kept in the `id` column and stripped from `body`.
pub struct PostgresDocumentStore {
    db: DbConn,
    references: References,
}

impl PostgresDocumentStore {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            references: References::default(),
        }
    }

    pub fn with_references(db: DbConn, references: References) -> Self {
        Self { db, references }
    }

    fn condition(collection: &str, filter: &Filter) -> Condition {
        let mut condition = Condition::all().add(document::Column::Collection.eq(collection));

        for (field, value) in filter.conditions() {
            condition = match (field.as_str(), value) {
                (ID_FIELD, Value::String(id)) => condition.add(document::Column::Id.eq(id.clone())),
                _ => {
                    let mut probe = Map::new();
                    probe.insert(field.clone(), value.clone());
                    condition.add(Expr::cust_with_values("body @> ?", [Value::Object(probe)]))
                }
            };
        }

        condition
    }

    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<document::Model>, StoreError> {
        let mut query = DocumentEntity::find().filter(Self::condition(collection, filter));

        for key in &options.sort {
            if !is_plain_field(&key.field) {
                tracing::warn!(field = %key.field, "Ignoring unsortable field");
                continue;
            }
            let order = if key.descending { Order::Desc } else { Order::Asc };
            query = query.order_by(Expr::cust(format!("body -> '{}'", key.field)), order);
        }

        query
            .offset(options.skip)
            .limit(effective_limit(options))
            .all(&self.db)
            .await
            .map_err(query_error)
    }
}

/// Only plain identifiers are spliced into sort expressions.
fn is_plain_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn query_error(err: DbErr) -> StoreError {
    let message = err.to_string();
    if message.contains("duplicate") || message.contains("unique") {
        StoreError::Constraint(message)
    } else {
        StoreError::Query(message)
    }
}

fn into_document(model: document::Model) -> Result<Document, StoreError> {
    match model.body {
        Value::Object(mut body) => {
            body.insert(ID_FIELD.to_string(), Value::String(model.id));
            Ok(body)
        }
        other => Err(StoreError::Malformed(format!(
            "{}.{} body is not an object: {other}",
            model.collection, model.id
        ))),
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents = self
            .select(collection, filter, options)
            .await?
            .into_iter()
            .map(into_document)
            .collect::<Result<Vec<_>, _>>()?;

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
        let id = match document.remove(ID_FIELD) {
            Some(Value::String(id)) => id,
            Some(other) => {
                return Err(StoreError::Validation(format!(
                    "{collection}.{ID_FIELD} should be a String, got {other}"
                )));
            }
            None => Uuid::new_v4().to_string(),
        };

        tracing::debug!(collection = %collection, id = %id, "Inserting document");

        let model = document::ActiveModel {
            id: ActiveValue::Set(id),
            collection: ActiveValue::Set(collection.to_string()),
            body: ActiveValue::Set(Value::Object(document)),
        }
        .insert(&self.db)
        .await
        .map_err(query_error)?;

        into_document(model)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        mut changes: Document,
    ) -> Result<Option<Document>, StoreError> {
        changes.remove(ID_FIELD);

        let Some(current) = self
            .select(collection, filter, &FindOptions::default())
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let mut merged = into_document(current.clone())?;
        merged.remove(ID_FIELD);
        merged.extend(changes);

        let model = document::ActiveModel {
            id: ActiveValue::Unchanged(current.id),
            collection: ActiveValue::Unchanged(current.collection),
            body: ActiveValue::Set(Value::Object(merged)),
        }
        .update(&self.db)
        .await
        .map_err(query_error)?;

        into_document(model).map(Some)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        let Some(target) = self
            .select(collection, filter, &options)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(0);
        };

        let result = DocumentEntity::delete_by_id(target.id)
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restgate_core::ports::SortField;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn row(id: &str, body: Value) -> document::Model {
        document::Model {
            id: id.to_string(),
            collection: "users".to_string(),
            body,
        }
    }

    #[tokio::test]
    async fn test_find_restores_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![
                row("2", json!({ "login": "test2" })),
                row("1", json!({ "login": "test" })),
            ]])
            .into_connection();
        let store = PostgresDocumentStore::new(db);

        let options = FindOptions {
            sort: vec![SortField::parse("-login").unwrap()],
            ..FindOptions::default()
        };
        let found = store.find("users", &Filter::all(), &options).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["_id"], json!("2"));
        assert_eq!(found[1]["login"], json!("test"));
    }

    #[tokio::test]
    async fn test_find_rejects_non_object_body() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![row("1", json!([1, 2]))]])
            .into_connection();
        let store = PostgresDocumentStore::new(db);

        let result = store
            .find_one("users", &Filter::by_id("1"), &FindOptions::default())
            .await;

        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_insert_returns_document_with_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![row("abc", json!({ "login": "test" }))]])
            .into_connection();
        let store = PostgresDocumentStore::new(db);

        let mut document = Document::new();
        document.insert("login".to_string(), json!("test"));
        let created = store.insert("users", document).await.unwrap();

        assert_eq!(created["_id"], json!("abc"));
        assert_eq!(created["login"], json!("test"));
    }

    #[tokio::test]
    async fn test_delete_counts_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![row("1", json!({ "login": "test" }))]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results(vec![Vec::<document::Model>::new()])
            .into_connection();
        let store = PostgresDocumentStore::new(db);

        assert_eq!(store.delete_one("users", &Filter::by_id("1")).await.unwrap(), 1);
        assert_eq!(store.delete_one("users", &Filter::by_id("1")).await.unwrap(), 0);
    }

    #[test]
    fn test_plain_field_check() {
        assert!(is_plain_field("login"));
        assert!(is_plain_field("created_at"));
        assert!(!is_plain_field("login'; drop table documents; --"));
        assert!(!is_plain_field(""));
    }
}
