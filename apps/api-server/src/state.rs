//! Application state - shared across all handlers.

use std::sync::Arc;

use serde_json::{Value, json};

use restgate_core::document::DocumentType;
use restgate_core::domain::{UserSchema, roles};
use restgate_core::error::StoreError;
use restgate_core::ports::{
    Document, DocumentStore, Filter, PasswordService, TokenService, UserRepository,
};
use restgate_core::resource::{ResourceConfig, RouteProtection};
use restgate_core::services::AuthService;
use restgate_infra::{
    Argon2PasswordService, DocumentUserRepository, InMemoryDocumentStore, JwtConfig,
    JwtTokenService,
};

use crate::config::{AppConfig, BootstrapAdmin};
use crate::resources::{ResourceError, ResourceRegistry};

/// Collection holding the principals.
pub const USERS_COLLECTION: &str = "users";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub resources: Arc<ResourceRegistry>,
    pub users: DocumentType,
    /// Lowercase name of the header carrying the refresh token.
    pub refresh_header: String,
}

/// The users resource: any ADMIN or USER, credentials never returned.
pub fn users_resource_config() -> ResourceConfig {
    ResourceConfig::global(RouteProtection::roles([roles::ADMIN, roles::USER]))
        .with_filter(["password", "refreshToken"])
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, ResourceError> {
        let store = Self::document_store(config).await;
        let state = Self::with_store(config, store)?;

        if let Some(admin) = &config.bootstrap_admin {
            if let Err(e) = state.bootstrap_admin(admin).await {
                tracing::error!("Failed to create bootstrap admin: {}", e);
            }
        }

        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// Wire services and resources over `store`.
    pub fn with_store(
        config: &AppConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, ResourceError> {
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
            secret: config.token_secret.clone(),
            access_token_ttl: config.access_token_ttl,
        }));

        let users = DocumentType::new(USERS_COLLECTION, store)
            .with_schema(Arc::new(UserSchema::new(passwords.clone())));
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(DocumentUserRepository::new(users.clone()));

        let auth = Arc::new(AuthService::new(user_repo, tokens, passwords));

        let resources = Arc::new(ResourceRegistry::new());
        resources.add_resource(USERS_COLLECTION, users.clone(), users_resource_config())?;

        Ok(Self {
            auth,
            resources,
            users,
            refresh_header: config.refresh_token_header.clone(),
        })
    }

    #[cfg(feature = "postgres")]
    async fn document_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
        use restgate_infra::PostgresDocumentStore;
        use restgate_infra::database;

        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryDocumentStore::new());
        };

        match database::connect(db_config).await {
            Ok(conn) => Arc::new(PostgresDocumentStore::new(conn)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryDocumentStore::new())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn document_store(_config: &AppConfig) -> Arc<dyn DocumentStore> {
        tracing::info!("Running without postgres feature - using in-memory store");
        Arc::new(InMemoryDocumentStore::new())
    }

    /// Create the configured administrator unless its login is taken.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<(), StoreError> {
        let existing = self
            .users
            .find_one(&Filter::all().eq("login", admin.login.as_str()))
            .await?;
        if existing.is_some() {
            tracing::debug!(login = %admin.login, "Bootstrap admin already exists");
            return Ok(());
        }

        let mut document = Document::new();
        document.insert("login".to_string(), Value::String(admin.login.clone()));
        document.insert("password".to_string(), Value::String(admin.password.clone()));
        document.insert("roles".to_string(), json!([roles::ADMIN, roles::USER]));

        self.users.create(document).await?;
        tracing::info!(login = %admin.login, "Bootstrap admin created");
        Ok(())
    }
}
