use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod op;
pub mod ops;

#[derive(Parser, Debug)]
#[command(name = "localdrop", version, about = "Serve dropped files from a local in-memory cache")]
pub struct Cli {
    /// Config directory (default: ~/.localdrop)
    #[arg(long, global = true, env = "LOCALDROP_DIR")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the config directory
    Init(ops::Init),
    /// Run the cache daemon in the foreground
    Daemon(ops::Daemon),
    /// Print version information
    Version(ops::Version),
}
