//! End-to-end photobooth session runner.

pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::TransactionClient;
pub use config::KioskConfig;
pub use error::{KioskError, KioskResult};
pub use session::BoothSession;
