//! Migration CLI for the document store (`up`, `down`, `status`, `fresh`, ...).

use sea_orm_migration::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if std::env::var("DATABASE_URL").is_err() {
        tracing::warn!("DATABASE_URL not set, pass the url with -u");
    }

    cli::run_cli(migration::Migrator).await;
}
