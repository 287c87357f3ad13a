use comanda::{
    api::{self, AppState},
    config::{database, server::ServerSettings, settings},
    core::{credentials::Argon2Hasher, seed},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Settings from the environment, then config.toml
    let server_settings = ServerSettings::from_env()?;
    let app_config = settings::load_config(&server_settings.config_path)
        .inspect(|_| info!("Loaded configuration from {}", server_settings.config_path))
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Database and schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    // 5. Reference data
    seed::seed_from_config(&db, &app_config, &Argon2Hasher::default())
        .await
        .inspect_err(|e| error!("Failed to seed reference data: {e}"))?;

    // 6. Serve
    let bind_addr = server_settings.bind_addr;
    let app = api::create_app(AppState::new(db, app_config, server_settings));
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutdown signal received");
}
