use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::service_config::{Config, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_PAYLOAD_MB};

pub const APP_NAME: &str = "localdrop";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "drop.sqlite";
pub const LOGS_DIR_NAME: &str = "logs";

/// Settings persisted in `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the daemon listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Largest accepted control request body, in megabytes
    #[serde(default = "default_max_payload_mb")]
    pub max_payload_mb: usize,
    /// Also write logs to rolling files under the logs directory
    #[serde(default)]
    pub log_to_file: bool,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_max_payload_mb() -> usize {
    DEFAULT_MAX_PAYLOAD_MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_payload_mb: default_max_payload_mb(),
            log_to_file: false,
        }
    }
}

/// On-disk application state: the config directory and the paths inside it
#[derive(Debug, Clone)]
pub struct AppState {
    pub drop_dir: PathBuf,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub logs_path: PathBuf,
    pub config: AppConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("not initialized, run `{APP_NAME} init` first (looked in {0})")]
    NotInitialized(PathBuf),

    #[error("already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("invalid listen address {0:?}")]
    InvalidListenAddr(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeConfig(#[from] toml::ser::Error),
}

impl AppState {
    /// Resolve the config directory: the given path, or `~/.localdrop`.
    pub fn drop_dir(custom: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match custom {
            Some(path) => Ok(path),
            None => dirs::home_dir()
                .map(|home| home.join(format!(".{}", APP_NAME)))
                .ok_or(StateError::NoHomeDirectory),
        }
    }

    fn at(drop_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path: drop_dir.join(CONFIG_FILE_NAME),
            db_path: drop_dir.join(DB_FILE_NAME),
            logs_path: drop_dir.join(LOGS_DIR_NAME),
            drop_dir,
            config,
        }
    }

    /// Create the config directory and write `config.toml`.
    pub fn init(custom: Option<PathBuf>, config: Option<AppConfig>) -> Result<Self, StateError> {
        let drop_dir = Self::drop_dir(custom)?;
        let state = Self::at(drop_dir, config.unwrap_or_default());

        if state.config_path.exists() {
            return Err(StateError::AlreadyInitialized(state.drop_dir));
        }
        state.validate()?;

        fs::create_dir_all(&state.drop_dir)?;
        fs::create_dir_all(&state.logs_path)?;
        fs::write(&state.config_path, toml::to_string_pretty(&state.config)?)?;

        tracing::info!("Initialized {} at {:?}", APP_NAME, state.drop_dir);
        Ok(state)
    }

    /// Load an initialized config directory.
    pub fn load(custom: Option<PathBuf>) -> Result<Self, StateError> {
        let drop_dir = Self::drop_dir(custom)?;
        let config_path = drop_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized(drop_dir));
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;
        let state = Self::at(drop_dir, config);
        state.validate()?;
        Ok(state)
    }

    fn validate(&self) -> Result<(), StateError> {
        self.config
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .map(|_| ())
            .map_err(|_| StateError::InvalidListenAddr(self.config.listen_addr.clone()))
    }

    /// Build the runtime configuration, optionally overriding the listen address.
    pub fn service_config(
        &self,
        listen_addr: Option<&str>,
        log_level: tracing::Level,
    ) -> Result<Config, StateError> {
        let listen_addr = listen_addr.unwrap_or(&self.config.listen_addr);
        let listen_addr = listen_addr
            .parse()
            .map_err(|_| StateError::InvalidListenAddr(listen_addr.to_string()))?;

        Ok(Config {
            listen_addr,
            sqlite_path: self.db_path.clone(),
            log_level,
            log_dir: self.config.log_to_file.then(|| self.logs_path.clone()),
            max_payload_bytes: self.config.max_payload_mb.saturating_mul(1024 * 1024),
        })
    }
}
