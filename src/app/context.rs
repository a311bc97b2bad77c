use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;

use crate::app::error::{FolioError, Result};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::gateway::{Gateway, HttpTableStore, Tables, TableStore};
use crate::store::SqliteLikedStore;

pub struct AppContext {
    pub config: Config,
    pub gateway: Gateway,
    pub likes: Arc<SqliteLikedStore>,
    /// Client for file downloads; no request timeout so large files can finish.
    pub http: Client,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        let likes = Arc::new(SqliteLikedStore::new(&db_path)?);
        Self::assemble(config, likes)
    }

    /// Context with a throwaway liked-set database.
    pub fn in_memory(config: Config) -> Result<Self> {
        let likes = Arc::new(SqliteLikedStore::in_memory()?);
        Self::assemble(config, likes)
    }

    fn assemble(config: Config, likes: Arc<SqliteLikedStore>) -> Result<Self> {
        let store: Arc<dyn TableStore + Send + Sync> =
            Arc::new(HttpTableStore::new(config.backend.clone())?);
        let cache = Arc::new(TtlCache::new(config.cache.ttl()));
        let gateway = Gateway::new(store, cache, Tables::from_config(&config.backend));

        let http = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            gateway,
            likes,
            http,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FolioError::Config("Could not find data directory".into()))?;
        let folio_dir = data_dir.join("folio");
        std::fs::create_dir_all(&folio_dir)?;
        Ok(folio_dir.join("folio.db"))
    }
}
