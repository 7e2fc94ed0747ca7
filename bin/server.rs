// Interior Estimate - Web Server
// REST API with Axum over the shared SQLite database

use anyhow::{Context, Result};
use interior_estimate::{
    api::{create_app, AppState},
    db,
    logging::init_logging,
    Settings, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    init_logging(&settings.env);

    info!(version = VERSION, env = ?settings.env, "🌐 Interior Estimate - Web Server");

    let conn = db::open_database(&settings.db_path)?;
    info!(path = %settings.db_path.display(), "✓ Database opened");

    let addr = settings.server_addr.clone();
    let state = AppState::new(conn, settings);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: http://{}/api/estimates", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
    }
}
