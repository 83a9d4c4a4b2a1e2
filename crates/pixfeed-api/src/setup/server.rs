//! Server startup and graceful shutdown

use anyhow::Result;
use axum::Router;
use pixfeed_core::Config;
use pixfeed_infra::shutdown_signal;

/// Start the server with graceful shutdown
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        storage_backend = %config.storage_backend(),
        transform_service = %config.transform_service_url(),
        transform_timeout_secs = config.transform_timeout().as_secs(),
        upload_timeout_secs = config.upload_timeout().as_secs(),
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
