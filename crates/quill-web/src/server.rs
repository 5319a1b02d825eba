use crate::{app, AppState, Result};
use quill_config::QuillConfig;
use tokio::net::TcpListener;
use tracing::info;

/// Serve Quill until Ctrl-C.
pub async fn start_server(config: QuillConfig) -> Result<()> {
    let bind_address = config.server.bind_address();
    let state = AppState::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Starting Quill on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Quill stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
