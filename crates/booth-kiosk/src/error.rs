//! Kiosk error types.

use thiserror::Error;

pub type KioskResult<T> = Result<T, KioskError>;

/// Errors that can end a kiosk session.
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session could not be resolved (scan to begin)")]
    ScanToBegin,

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Media(#[from] booth_media::MediaError),

    #[error(transparent)]
    Storage(#[from] booth_storage::StorageError),
}

impl KioskError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
