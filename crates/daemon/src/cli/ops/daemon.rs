use clap::Args;

use localdrop_daemon::state::AppState;
use localdrop_daemon::{init_logging, start_service};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the listen address from config.toml
    #[arg(long)]
    pub listen_addr: Option<String>,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] localdrop_daemon::state::StateError),

    #[error("daemon failed: {0}")]
    Failed(#[from] localdrop_daemon::ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let config = state.service_config(self.listen_addr.as_deref(), self.log_level)?;

        let _guard = init_logging(config.log_level, config.log_dir.as_deref());
        tracing::info!("Using config directory {:?}", state.drop_dir);

        start_service(&config).await?;
        Ok("daemon stopped".to_string())
    }
}
