use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use localdrop_daemon::state::{AppConfig, AppState};
use localdrop_daemon::service_config::{DEFAULT_LISTEN_ADDR, DEFAULT_MAX_PAYLOAD_MB};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Address the daemon listens on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Largest accepted control request body, in megabytes
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_MB)]
    pub max_payload_mb: usize,

    /// Also write daily rolling log files to the config directory
    #[arg(long)]
    pub log_to_file: bool,
}

#[derive(Debug)]
pub struct InitOutput {
    pub drop_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub logs_path: PathBuf,
    pub listen_addr: String,
    pub max_payload_mb: usize,
    pub log_to_file: bool,
}

impl fmt::Display for InitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} localdrop at {}",
            "Initialized".green().bold(),
            self.drop_dir.display().to_string().bold()
        )?;
        writeln!(f, "  {} {}", "Database:".dimmed(), self.db_path.display())?;
        writeln!(f, "  {} {}", "Config:".dimmed(), self.config_path.display())?;
        writeln!(f, "  {} {}", "Listen address:".dimmed(), self.listen_addr)?;
        writeln!(f, "  {} {} MB", "Max payload:".dimmed(), self.max_payload_mb)?;
        let logs = if self.log_to_file {
            self.logs_path.display().to_string()
        } else {
            "stderr only".to_string()
        };
        write!(f, "  {} {}", "Logs:".dimmed(), logs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] localdrop_daemon::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = InitOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            listen_addr: self.listen_addr.clone(),
            max_payload_mb: self.max_payload_mb,
            log_to_file: self.log_to_file,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(InitOutput {
            drop_dir: state.drop_dir,
            db_path: state.db_path,
            config_path: state.config_path,
            logs_path: state.logs_path,
            listen_addr: state.config.listen_addr,
            max_payload_mb: state.config.max_payload_mb,
            log_to_file: state.config.log_to_file,
        })
    }
}
