use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::http_server;
use crate::service_config::Config;
use crate::service_state::State;

pub const LOG_FILE_PREFIX: &str = "localdrop.log";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `level`. When `log_dir` is set, a daily rolling file
/// is written alongside stderr; keep the returned guard alive until exit or
/// buffered lines are lost. Installing twice is a no-op.
pub fn init_logging(level: tracing::Level, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

/// Serve the router on `listener` until `shutdown` resolves.
///
/// After the listener stops, queued durable store work is drained so the
/// last accepted generation reaches the store before returning.
pub async fn serve<F>(
    listener: TcpListener,
    state: State,
    max_payload_bytes: usize,
    shutdown: F,
) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = http_server::router(state.clone(), max_payload_bytes);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped, flushing pending store writes");
    if let Err(e) = state.cache().flush().await {
        tracing::warn!("Failed to flush pending store writes: {}", e);
    }

    Ok(())
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, ServiceError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Bind { addr, source })
}

/// Run the daemon in the foreground until Ctrl-C.
pub async fn start_service(config: &Config) -> Result<(), ServiceError> {
    let state = State::from_config(config).await;
    let listener = bind(config.listen_addr).await?;
    tracing::info!("Serving file cache on http://{}", listener.local_addr()?);

    serve(listener, state, config.max_payload_bytes, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
    })
    .await
}

/// Run the daemon in a background task.
///
/// Binding happens before this returns, so port `0` can be used and the
/// chosen port read back from the handle.
pub async fn spawn_service(config: &Config) -> Result<ShutdownHandle, ServiceError> {
    let state = State::from_config(config).await;
    let listener = bind(config.listen_addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Serving file cache on http://{}", local_addr);

    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(serve(
        listener,
        state.clone(),
        config.max_payload_bytes,
        async move {
            let _ = rx.await;
        },
    ));

    Ok(ShutdownHandle {
        state,
        local_addr,
        tx,
        task,
    })
}

/// Handle to a daemon started with [`spawn_service`].
pub struct ShutdownHandle {
    state: State,
    local_addr: SocketAddr,
    tx: oneshot::Sender<()>,
    task: JoinHandle<Result<(), ServiceError>>,
}

impl ShutdownHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Stop accepting requests and wait for pending store writes.
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        let _ = self.tx.send(());
        self.task.await?
    }
}
