//! Session-owned asset cache.
//!
//! Overlay sequences and background plates are decoded up front so the tick
//! loop never touches the filesystem. The cache reports a sequence ready only
//! once every frame has decoded, which is what prevents the half-loaded
//! flicker the preview is otherwise prone to. A load timeout turns a missing
//! or truncated asset into an error instead of a hang.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;
use rayon::prelude::*;
use tracing::{debug, info};

use booth_models::AnimationSequence;

use crate::error::{MediaError, MediaResult};

/// Default per-load timeout.
const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 10;

/// Asset cache configuration.
#[derive(Debug, Clone)]
pub struct AssetCacheConfig {
    /// Root directory all sequence/background paths resolve against
    pub root: PathBuf,
    /// Timeout for a single load_* call
    pub load_timeout: Duration,
}

impl AssetCacheConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }
}

/// A fully decoded overlay sequence.
#[derive(Clone, Debug)]
pub struct FrameSet {
    frames: Vec<Arc<RgbaImage>>,
}

impl FrameSet {
    /// Build from already-decoded frames (tests, pre-rendered sets).
    pub fn from_frames(frames: Vec<Arc<RgbaImage>>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, which must already be wrapped modulo `len`.
    pub fn frame(&self, index: usize) -> &Arc<RgbaImage> {
        &self.frames[index]
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CacheState {
    Ready,
    Released,
}

struct CacheInner {
    state: CacheState,
    images: HashMap<PathBuf, Arc<RgbaImage>>,
}

/// Decoded-image cache for one session.
///
/// Owned by the session and released when it ends; not a process-wide
/// singleton. Lookups after `release()` are errors.
pub struct AssetCache {
    config: AssetCacheConfig,
    inner: Mutex<CacheInner>,
}

impl AssetCache {
    pub fn new(config: AssetCacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner {
                state: CacheState::Ready,
                images: HashMap::new(),
            }),
        }
    }

    /// Decode every frame of a sequence in parallel.
    ///
    /// Returns only once all frames are decoded, or errors on the first
    /// failed decode / on timeout.
    pub async fn load_sequence(&self, sequence: &AnimationSequence) -> MediaResult<FrameSet> {
        self.ensure_ready()?;

        let paths: Vec<PathBuf> = sequence
            .frames()
            .iter()
            .map(|p| self.config.root.join(p))
            .collect();

        let to_decode: Vec<PathBuf> = {
            let inner = self.inner.lock().expect("asset cache lock");
            paths
                .iter()
                .filter(|p| !inner.images.contains_key(*p))
                .cloned()
                .collect()
        };

        if !to_decode.is_empty() {
            let decoded = self.decode_batch(to_decode).await?;
            let mut inner = self.inner.lock().expect("asset cache lock");
            if inner.state == CacheState::Released {
                return Err(MediaError::AssetsReleased);
            }
            inner.images.extend(decoded);
        }

        let inner = self.inner.lock().expect("asset cache lock");
        let frames = paths
            .iter()
            .map(|p| {
                inner
                    .images
                    .get(p)
                    .cloned()
                    .ok_or_else(|| MediaError::asset_decode(p.clone(), "missing after decode"))
            })
            .collect::<MediaResult<Vec<_>>>()?;

        debug!(frames = frames.len(), "Sequence ready");
        Ok(FrameSet { frames })
    }

    /// Decode a single image (background plates).
    pub async fn load_image(&self, path: impl AsRef<Path>) -> MediaResult<Arc<RgbaImage>> {
        self.ensure_ready()?;
        let full = self.config.root.join(path.as_ref());

        if let Some(img) = {
            let inner = self.inner.lock().expect("asset cache lock");
            inner.images.get(&full).cloned()
        } {
            return Ok(img);
        }

        let decoded = self.decode_batch(vec![full.clone()]).await?;
        let mut inner = self.inner.lock().expect("asset cache lock");
        if inner.state == CacheState::Released {
            return Err(MediaError::AssetsReleased);
        }
        inner.images.extend(decoded);
        inner
            .images
            .get(&full)
            .cloned()
            .ok_or_else(|| MediaError::asset_decode(full, "missing after decode"))
    }

    /// Drop every decoded image. Further loads fail with `AssetsReleased`.
    pub fn release(&self) {
        let mut inner = self.inner.lock().expect("asset cache lock");
        let count = inner.images.len();
        inner.images.clear();
        inner.state = CacheState::Released;
        info!(released = count, "Asset cache released");
    }

    fn ensure_ready(&self) -> MediaResult<()> {
        let inner = self.inner.lock().expect("asset cache lock");
        if inner.state == CacheState::Released {
            return Err(MediaError::AssetsReleased);
        }
        Ok(())
    }

    async fn decode_batch(
        &self,
        paths: Vec<PathBuf>,
    ) -> MediaResult<Vec<(PathBuf, Arc<RgbaImage>)>> {
        let timeout = self.config.load_timeout;
        let task = tokio::task::spawn_blocking(move || {
            paths
                .par_iter()
                .map(|path| {
                    let img = image::open(path)
                        .map_err(|e| MediaError::asset_decode(path.clone(), e.to_string()))?;
                    Ok((path.clone(), Arc::new(img.to_rgba8())))
                })
                .collect::<MediaResult<Vec<_>>>()
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined.map_err(|e| MediaError::internal(format!("decode task: {e}")))?,
            Err(_) => Err(MediaError::AssetTimeout(timeout.as_secs())),
        }
    }
}
