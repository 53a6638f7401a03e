//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging; it skips `.env`
//! loading and reads its configuration straight from the environment. The
//! workspace's main `pmr-run` binary is the production entry point.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pmr_core::config::{data_file_from_env_value, CoreConfig};
use pmr_store::JsonFileStore;

/// Main entry point for the PMR REST API server
///
/// Starts the REST API server on the configured address (default:
/// 0.0.0.0:3000) with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `PMR_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PMR_DATA_FILE`: Record document path (default: "patients.json")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the record document path is unusable,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PMR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting PMR REST API on {}", addr);

    let cfg = CoreConfig::new(data_file_from_env_value(
        std::env::var("PMR_DATA_FILE").ok(),
    ))?;
    let store = JsonFileStore::new(cfg.data_file())?;

    let app = api_rest::router(store);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
