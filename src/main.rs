//! MDCMS Server - Binary Entry Point
//!
//! Loads `config.json`, starts the periodic analytics flush and serves HTTP
//! until SIGINT/SIGTERM, then flushes buffered visits before exiting.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use mdcms::{create_router, AppState, CmsResult, ServerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mdcms=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CmsResult<()> {
    let config = ServerConfig::load()?;
    tracing::info!("MDCMS v{}", mdcms::VERSION);
    tracing::info!("Content directory: {}", config.content_dir.display());
    tracing::info!("Analytics log: {}", config.analytics_file.display());

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config)?);
    let analytics = Arc::clone(&state.analytics);
    analytics.start_flush_task();

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("MDCMS server running on http://{}", addr);

    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutting down gracefully...");
    analytics.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
