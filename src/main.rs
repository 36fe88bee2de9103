use tracing_subscriber::EnvFilter;

use newsroom_api::config;
use newsroom_api::database::Database;
use newsroom_api::resource::Registry;
use newsroom_api::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, PORT, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_filter)),
        )
        .init();

    tracing::info!("Starting Newsroom API in {:?} mode", config.environment);

    let registry = Registry::builtin()?;
    let db = Database::connect(&config.database).await?;
    db.ensure_schema(&registry).await?;

    let app = server::app(AppState::new(db, registry));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("🚀 Newsroom API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
