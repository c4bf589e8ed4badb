//! Application state.

use booth_db::TransactionStore;

use crate::config::ApiConfig;
use crate::security::SessionCrypto;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: TransactionStore,
    pub crypto: SessionCrypto,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = TransactionStore::connect(&config.database_url).await?;
        let crypto = SessionCrypto::from_env()?;

        Ok(Self {
            config,
            store,
            crypto,
        })
    }

    /// State over an in-memory store with fixed key material (tests).
    pub async fn for_tests() -> Self {
        Self {
            config: ApiConfig::default(),
            store: TransactionStore::in_memory().await.expect("memory store"),
            crypto: SessionCrypto::new([7u8; 32], [3u8; 16]),
        }
    }
}
