//! Server lifecycle: prepare the store, bind, serve until shutdown.

use crate::{ApiState, KeepsakeConfig, create_router};
use keepsake_error::{KeepsakeResult, ServerError, ServerErrorKind, StorageError, StorageErrorKind};
use keepsake_storage::sweep_staging;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Create the upload directory and clear staging files left by a crash.
///
/// # Errors
///
/// Returns `DirectoryCreation` if the directory cannot be created.
#[instrument(skip_all, fields(upload_dir = %config.upload_dir().display()))]
pub async fn prepare_store(config: &KeepsakeConfig) -> KeepsakeResult<()> {
    tokio::fs::create_dir_all(config.upload_dir())
        .await
        .map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                config.upload_dir().display(),
                e
            )))
        })?;

    if let Err(e) = sweep_staging(config.upload_dir()).await {
        warn!(error = %e, "Skipped staging sweep");
    }
    Ok(())
}

/// Run the HTTP server until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the store cannot be prepared, the address cannot be
/// bound, or the server loop fails.
#[instrument(skip_all, fields(bind = %config.bind()))]
pub async fn serve(config: KeepsakeConfig) -> KeepsakeResult<()> {
    prepare_store(&config).await?;

    let state = ApiState::new(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind())
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Bind(format!("{}: {}", config.bind(), e))))?;

    info!(
        upload_dir = %config.upload_dir().display(),
        max_upload_bytes = config.max_upload_bytes(),
        "Keepsake listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Serve(e.to_string())))?;

    info!("Keepsake stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
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
    info!("Shutdown signal received");
}
