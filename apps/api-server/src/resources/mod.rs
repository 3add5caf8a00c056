//! Resource router factory.
//!
//! A [`Resource`] binds a document type to five CRUD routes mounted under
//! `/{name}`, each protected according to its [`ResourceConfig`].

mod handlers;
mod query;

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use actix_web::{Route, web};

use restgate_core::document::DocumentType;
use restgate_core::ports::Document;
use restgate_core::resource::{EffectiveConfig, ResourceConfig, RouteKey, resolve_route_config};
use restgate_core::services::AuthService;

use crate::middleware::auth::{RequiresLogin, RequiresRole};
use crate::middleware::error::no_route_mapped;

pub use query::parse_query_parameters;

/// Resource construction errors. Raised at startup, never sent to clients.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("A resource name is required")]
    MissingName,
}

/// A document type exposed over HTTP.
pub struct Resource {
    name: String,
    documents: DocumentType,
    config: ResourceConfig,
}

impl Resource {
    pub fn new(
        name: impl Into<String>,
        documents: DocumentType,
        config: ResourceConfig,
    ) -> Result<Self, ResourceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ResourceError::MissingName);
        }

        Ok(Self {
            name,
            documents,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn documents(&self) -> &DocumentType {
        &self.documents
    }

    /// Strip the configured filter fields from a returned document.
    pub fn apply_filter(&self, mut document: Document) -> Document {
        for field in &self.config.filter {
            document.remove(field);
        }
        document
    }

    fn protect(&self, route: Route, key: RouteKey, auth: &Arc<AuthService>) -> Route {
        let protection = resolve_route_config(&self.config, key);
        tracing::debug!(
            resource = %self.name,
            method = key.method(),
            path = key.path(),
            protection = ?protection,
            "Mounting route"
        );

        // Route middleware runs last-registered first.
        match protection {
            EffectiveConfig::Public => route,
            EffectiveConfig::Authenticated => route.wrap(RequiresLogin::new(auth.clone())),
            EffectiveConfig::Restricted(roles) => route
                .wrap(RequiresRole::new(roles))
                .wrap(RequiresLogin::new(auth.clone())),
        }
    }

    /// Mount the five routes under `/{name}`.
    pub fn configure(self: &Arc<Self>, cfg: &mut web::ServiceConfig, auth: &Arc<AuthService>) {
        cfg.service(
            web::scope(&format!("/{}", self.name))
                .app_data(web::Data::from(Arc::clone(self)))
                .service(
                    web::resource(["", "/"])
                        .route(self.protect(web::get().to(handlers::list), RouteKey::List, auth))
                        .route(self.protect(web::post().to(handlers::create), RouteKey::Post, auth))
                        .default_service(web::to(no_route_mapped)),
                )
                .service(
                    web::resource("/{id}")
                        .route(self.protect(web::get().to(handlers::get), RouteKey::Get, auth))
                        .route(self.protect(web::put().to(handlers::update), RouteKey::Put, auth))
                        .route(self.protect(
                            web::delete().to(handlers::delete),
                            RouteKey::Delete,
                            auth,
                        ))
                        .default_service(web::to(no_route_mapped)),
                ),
        );
    }
}

/// Registered resources, owned by the application state.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: RwLock<BTreeMap<String, Arc<Resource>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource, replacing any previous one with the same name.
    pub fn add_resource(
        &self,
        name: impl Into<String>,
        documents: DocumentType,
        config: ResourceConfig,
    ) -> Result<Arc<Resource>, ResourceError> {
        let resource = Arc::new(Resource::new(name, documents, config)?);

        let mut resources = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        if resources
            .insert(resource.name.clone(), resource.clone())
            .is_some()
        {
            tracing::warn!(resource = %resource.name, "Replacing registered resource");
        }

        Ok(resource)
    }

    pub fn get_resource(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn remove_resource(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Mount every registered resource.
    pub fn configure(&self, cfg: &mut web::ServiceConfig, auth: &Arc<AuthService>) {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        for resource in resources.values() {
            resource.configure(cfg, auth);
        }
    }

    /// Drop every registered resource.
    pub fn clear(&self) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restgate_core::resource::RouteProtection;
    use restgate_infra::InMemoryDocumentStore;
    use serde_json::json;

    fn documents() -> DocumentType {
        DocumentType::new("things", Arc::new(InMemoryDocumentStore::new()))
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = Resource::new("", documents(), ResourceConfig::default());

        assert!(matches!(result, Err(ResourceError::MissingName)));
    }

    #[test]
    fn test_apply_filter_strips_fields() {
        let resource = Resource::new(
            "things",
            documents(),
            ResourceConfig::default().with_filter(["password", "refreshToken"]),
        )
        .unwrap();
        let document = json!({ "login": "test", "password": "x", "refreshToken": "y" })
            .as_object()
            .cloned()
            .unwrap();

        let filtered = resource.apply_filter(document);

        assert_eq!(serde_json::Value::Object(filtered), json!({ "login": "test" }));
    }

    #[test]
    fn test_registry_lifecycle() {
        let registry = ResourceRegistry::new();

        registry
            .add_resource("things", documents(), ResourceConfig::default())
            .unwrap();
        registry
            .add_resource(
                "others",
                documents(),
                ResourceConfig::global(RouteProtection::authenticated()),
            )
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_resource("things").unwrap().name(), "things");

        assert!(registry.remove_resource("things").is_some());
        assert!(registry.get_resource("things").is_none());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_rejects_empty_name() {
        let registry = ResourceRegistry::new();

        let result = registry.add_resource("", documents(), ResourceConfig::default());

        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
