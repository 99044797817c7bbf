//! # zvonek-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the door hub.
//! Binds to `0.0.0.0:$PORT` (default 8000).

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use zvonek_api::state::{AppConfig, AppState};
use zvonek_core::ZvonekError;
use zvonek_hub::{FrameSource, StillImageSource};

#[tokio::main]
async fn main() -> Result<(), ZvonekError> {
    // Initialize structured tracing.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("ZVONEK_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration invalid: {e}");
        e
    })?;
    if config.using_dev_secret {
        tracing::warn!(
            "ZVONEK_JWT_SECRET not set; using the built-in development secret. \
             Anyone can mint lock tokens against this instance."
        );
    }
    tracing::debug!(?config, "configuration loaded");

    // Camera is optional; without one the stream endpoint answers 500.
    let camera: Option<Arc<dyn FrameSource>> = match &config.camera_still {
        Some(path) => match StillImageSource::open(path) {
            Ok(source) => {
                tracing::info!(path = %path.display(), "still-image camera configured");
                Some(Arc::new(source) as Arc<dyn FrameSource>)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "Camera unavailable: {e}. Camera stream will return 500.");
                None
            }
        },
        None => {
            tracing::warn!("No camera configured. Camera stream will return 500.");
            None
        }
    };

    let port = config.port;
    let state = AppState::with_config(config, camera);
    let app = zvonek_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Zvonek API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Zvonek API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
