//! Object storage for captured media.
//!
//! This crate provides:
//! - An S3 client configured from the environment
//! - The consent-gated share gateway with fire-and-forget uploads

pub mod client;
pub mod error;
pub mod gateway;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use gateway::{ObjectStore, ShareGateway, ShareOutcome};
