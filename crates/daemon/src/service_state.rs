use common::FileCache;
use store::Database;

use crate::service_config::Config;

/// Main service state, shared with every HTTP handler
#[derive(Clone, Debug)]
pub struct State {
    cache: FileCache,
    database: Database,
}

impl State {
    /// Open the durable store and activate the cache from it.
    ///
    /// An unusable store is not fatal: the cache starts empty and keeps
    /// serving from memory, and every later store operation logs its own
    /// failure.
    pub async fn from_config(config: &Config) -> Self {
        let database = match Database::new(&config.sqlite_path).await {
            Ok(database) => database,
            Err(e) => {
                tracing::warn!(
                    "Durable store at {:?} unavailable, serving from memory only: {}",
                    config.sqlite_path,
                    e
                );
                Database::new_lazy(&config.sqlite_path)
            }
        };

        let cache = FileCache::activate(database.clone()).await;
        Self { cache, database }
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}
