use std::net::SocketAddr;
use std::path::PathBuf;

/// Default address the daemon listens on.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5380";

/// Default upper bound for a control request body, in megabytes.
pub const DEFAULT_MAX_PAYLOAD_MB: usize = 256;

/// Runtime configuration for one daemon process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address for the HTTP listener
    pub listen_addr: SocketAddr,
    /// SQLite file backing the durable store
    pub sqlite_path: PathBuf,
    /// Default log level; `RUST_LOG` takes precedence
    pub log_level: tracing::Level,
    /// Directory for rolling log files, if file logging is enabled
    pub log_dir: Option<PathBuf>,
    /// Largest accepted control request body
    pub max_payload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5380)),
            sqlite_path: PathBuf::from("drop.sqlite"),
            log_level: tracing::Level::INFO,
            log_dir: None,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_MB * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listen_addr_matches_constant() {
        let config = Config::default();
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR.parse().unwrap());
        assert_eq!(config.max_payload_bytes, 256 * 1024 * 1024);
        assert!(config.log_dir.is_none());
    }
}
