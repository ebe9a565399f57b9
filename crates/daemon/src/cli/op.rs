use std::fmt::Display;
use std::path::PathBuf;

/// Shared inputs for every CLI operation.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    /// Config directory override; `None` means `~/.localdrop`
    pub config_path: Option<PathBuf>,
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: Display;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}
