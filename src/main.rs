use std::net::SocketAddr;
use std::path::Path;

use contact_tracer::app_state::AppState;
use contact_tracer::config::{ConfigError, ServerConfig};
use contact_tracer::{db, handlers, logging};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    let config_path =
        std::env::var("SERVER_CONFIG_PATH").unwrap_or_else(|_| "res/config.toml".to_string());

    let config = ServerConfig::load(Path::new(&config_path)).await?;
    logging::init_tracing(&config)?;

    let dialect = config.dialect()?;
    info!(mode = ?config.app.mode, ?dialect, "server mode configured");
    info!(host = %config.http.host, port = config.http.port, "server http bind");

    let store = db::connect_store(&config, Path::new(&config_path)).await?;
    info!(backend = store.backend(), "store ready");

    let state = AppState::new(store).with_deduplication(config.contacts.deduplicate);

    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .map_err(|e| ConfigError::Invalid(format!("invalid http bind: {e}")))?;

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConfigError::Invalid(format!("http server error: {e}")))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
