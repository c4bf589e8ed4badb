//! Consent-gated share gateway.
//!
//! Every capture can be saved/shared locally. Uploading to durable storage
//! additionally requires the visitor's decrypted consent flag and the age
//! floor; both come from `SessionParams` and never from client-toggleable
//! state. The upload runs detached so a slow or failing bucket can never
//! hold up the visitor's share action.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use booth_models::{MediaKind, SessionParams};

use crate::error::StorageResult;

/// Seam over the storage backend so the gate is testable.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;
}

/// Outcome of a share action.
#[derive(Debug, Clone)]
pub struct ShareOutcome {
    /// Local artifact offered for download/share
    pub local_path: PathBuf,
    /// Suggested download filename
    pub download_name: String,
    /// Whether an upload was started (consent + age gate passed)
    pub upload_started: bool,
}

/// Hands captures to the visitor and, when permitted, to storage.
pub struct ShareGateway<S: ObjectStore + 'static> {
    store: Arc<S>,
}

impl<S: ObjectStore + 'static> ShareGateway<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Storage key: `{userId}_{displayName}/{image|video}/{timestamp}_{filename}`.
    pub fn media_key(
        params: &SessionParams,
        artist_name: &str,
        kind: MediaKind,
        timestamp_ms: i64,
        filename: &str,
    ) -> String {
        format!(
            "{}_{}/{}/{}_{}",
            params.user_id,
            artist_name,
            kind.key_part(),
            timestamp_ms,
            filename
        )
    }

    /// Share a capture.
    ///
    /// The local path is always returned immediately. The upload, when the
    /// gate passes, is spawned and forgotten: its failure is logged, never
    /// surfaced, and never delays the local path.
    pub fn share(
        &self,
        params: &SessionParams,
        artist_name: &str,
        kind: MediaKind,
        local_path: &Path,
    ) -> ShareOutcome {
        let download_name = kind.download_name(artist_name);
        let upload_permitted = params.upload_permitted();

        if upload_permitted {
            let key = Self::media_key(
                params,
                artist_name,
                kind,
                Utc::now().timestamp_millis(),
                &download_name,
            );
            let store = Arc::clone(&self.store);
            let path = local_path.to_path_buf();
            let content_type = kind.mime();

            tokio::spawn(async move {
                match store.put_file(&path, &key, content_type).await {
                    Ok(()) => info!(key = %key, "Capture uploaded"),
                    Err(e) => warn!(key = %key, "Capture upload failed: {e}"),
                }
            });
        } else {
            info!("Upload skipped: no consent or under age floor");
        }

        ShareOutcome {
            local_path: local_path.to_path_buf(),
            download_name,
            upload_started: upload_permitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every put without touching a network.
    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put_file(
            &self,
            _path: &Path,
            key: &str,
            _content_type: &str,
        ) -> StorageResult<()> {
            self.puts.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    /// Always fails, to prove failure never surfaces.
    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn put_file(
            &self,
            _path: &Path,
            _key: &str,
            _content_type: &str,
        ) -> StorageResult<()> {
            Err(crate::error::StorageError::upload_failed("bucket offline"))
        }
    }

    fn params(consent: bool, age: u32) -> SessionParams {
        SessionParams::new("U1000", consent, age, 4)
    }

    #[test]
    fn test_media_key_layout() {
        let key = ShareGateway::<RecordingStore>::media_key(
            &params(true, 25),
            "KHUNPOL",
            MediaKind::Image,
            1735000000000,
            "KHUNPOL-image.png",
        );
        assert_eq!(key, "U1000_KHUNPOL/image/1735000000000_KHUNPOL-image.png");
    }

    #[tokio::test]
    async fn test_upload_iff_consent_and_age() {
        let store = Arc::new(RecordingStore::default());
        let gateway = ShareGateway::new(Arc::clone(&store));
        let file = tempfile::NamedTempFile::new().unwrap();

        // Consented adult: upload starts
        let outcome = gateway.share(&params(true, 25), "NEX", MediaKind::Image, file.path());
        assert!(outcome.upload_started);

        // No consent: no upload
        let outcome = gateway.share(&params(false, 25), "NEX", MediaKind::Image, file.path());
        assert!(!outcome.upload_started);

        // Consented but under the age floor: no upload
        let outcome = gateway.share(&params(true, 19), "NEX", MediaKind::Video, file.path());
        assert!(!outcome.upload_started);

        // Let the spawned upload land
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert!(puts[0].starts_with("U1000_NEX/image/"));
    }

    #[tokio::test]
    async fn test_upload_failure_never_blocks_share() {
        let gateway = ShareGateway::new(Arc::new(FailingStore));
        let file = tempfile::NamedTempFile::new().unwrap();

        let outcome = gateway.share(&params(true, 30), "THAI", MediaKind::Video, file.path());
        // The share action succeeds regardless of the bucket
        assert!(outcome.upload_started);
        assert_eq!(outcome.download_name, "THAI-video.webm");
        assert_eq!(outcome.local_path, file.path());
    }
}
