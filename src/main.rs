use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pmr_core::config::{data_file_from_env_value, CoreConfig};
use pmr_store::JsonFileStore;

/// Main entry point for the PMR application
///
/// Starts the REST server (default port 3000) serving the patient record
/// API with OpenAPI/Swagger documentation at `/swagger-ui`.
///
/// # Environment Variables
/// - `PMR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PMR_DATA_FILE`: Path of the JSON record document (default: "patients.json")
///
/// A `.env` file in the working directory is honoured.
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("pmr=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PMR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_file = data_file_from_env_value(std::env::var("PMR_DATA_FILE").ok());

    tracing::info!("++ Starting PMR REST on {}", rest_addr);
    tracing::info!("++ Record document: {}", data_file.display());

    let cfg = CoreConfig::new(data_file)?;
    let store = JsonFileStore::new(cfg.data_file())?;

    let app = api_rest::router(store);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
