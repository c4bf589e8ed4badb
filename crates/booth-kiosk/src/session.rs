//! One photobooth session, end to end.
//!
//! Phases: spin (outcome randomizer) -> live preview -> capture -> review
//! -> share. Each phase's periodic work runs under its own scheduler and is
//! cancelled before the next phase starts, so no loop ever composites into
//! a torn-down phase.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::info;

use booth_media::{
    AssetCache, AssetCacheConfig, CameraConfig, CaptureConfig, CaptureController, Compositor,
    FfmpegCameraSource, FrameCursor, OrtSegmenter, SceneConfig, Scheduler, SegmenterConfig,
    SpinPolicy, SpinRunner, Surface, TICK_PERIOD,
};
use booth_models::{
    AnimationSequence, ArtistProfile, FrameCadence, MediaKind, SequenceVariant, SessionParams,
};
use booth_storage::{ObjectStore, ShareGateway, ShareOutcome};

use crate::client::TransactionClient;
use crate::config::KioskConfig;
use crate::error::{KioskError, KioskResult};

/// Drives one visitor through the booth.
pub struct BoothSession<S: ObjectStore + 'static> {
    config: KioskConfig,
    params: SessionParams,
    artist: &'static ArtistProfile,
    client: TransactionClient,
    gateway: ShareGateway<S>,
    cache: Arc<AssetCache>,
}

impl<S: ObjectStore + 'static> BoothSession<S> {
    pub fn new(
        config: KioskConfig,
        params: SessionParams,
        client: TransactionClient,
        gateway: ShareGateway<S>,
    ) -> KioskResult<Self> {
        let artist = ArtistProfile::by_id(params.artist_id).ok_or(KioskError::ScanToBegin)?;
        let cache = Arc::new(AssetCache::new(AssetCacheConfig::new(&config.assets_root)));

        Ok(Self {
            config,
            params,
            artist,
            client,
            gateway,
            cache,
        })
    }

    /// Run the session to completion and return the share outcome.
    pub async fn run(self, surface: Arc<Mutex<dyn Surface>>) -> KioskResult<ShareOutcome> {
        info!(
            artist = %self.artist.name,
            access_id = self.params.access_id.as_str(),
            "Session starting"
        );

        // Spin phase: one weighted draw decides the overlay variant
        let outcome = self.run_spin(Arc::clone(&surface)).await?;
        let variant = match outcome {
            booth_media::Outcome::Secret => SequenceVariant::Secret,
            booth_media::Outcome::Normal => SequenceVariant::Normal,
        };

        // Capture phase
        let share = self.run_capture(variant, surface).await?;

        self.cache.release();
        Ok(share)
    }

    async fn run_spin(&self, surface: Arc<Mutex<dyn Surface>>) -> KioskResult<booth_media::Outcome> {
        let policy = SpinPolicy::new(self.config.secret_probability)?;
        let runner = SpinRunner::new(policy, Arc::clone(&self.cache));
        let mut rng = StdRng::from_os_rng();

        // The spin runs inline; the cancel channel exists so an abandoned
        // session can stop playback between frames
        let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let mut surface = surface.lock().await;
        let outcome = runner.run(&mut rng, &mut *surface, &cancel_rx).await?;

        info!(outcome = ?outcome, "Spin finished, capture phase ready");
        Ok(outcome)
    }

    async fn run_capture(
        &self,
        variant: SequenceVariant,
        surface: Arc<Mutex<dyn Surface>>,
    ) -> KioskResult<ShareOutcome> {
        // Overlay sequence for the drawn variant
        let pattern = match variant {
            SequenceVariant::Secret => &self.artist.secret,
            _ => &self.artist.normal,
        };
        let sequence =
            AnimationSequence::from_pattern(pattern, FrameCadence::OVERLAY, variant);
        let overlay = self.cache.load_sequence(&sequence).await?;
        let overlay_len = overlay.len();
        let overlay_delay = sequence.delay(0);

        // Artist backdrop behind the segmented visitor
        let plate = self.cache.load_image(&self.artist.background).await?;
        let scene = SceneConfig {
            background: booth_models::BackgroundKind::Image(self.artist.background.clone()),
            ..SceneConfig::default()
        };
        let compositor = Compositor::new(
            self.config.canvas_width,
            self.config.canvas_height,
            scene,
            Some(plate),
        )?;

        let segmenter = Arc::new(OrtSegmenter::load(
            &self.config.model_path,
            SegmenterConfig::default(),
        )?);

        let mut camera = FfmpegCameraSource::new(CameraConfig {
            device: self.config.camera_device.clone(),
            input_format: self.config.camera_format.clone(),
            ..CameraConfig::default()
        });
        camera.open().await?;

        let cursor = FrameCursor::new();
        let controller = Arc::new(Mutex::new(CaptureController::new(
            CaptureConfig::new(&self.config.output_dir),
            Box::new(camera),
            segmenter,
            compositor,
            overlay,
            Arc::clone(&cursor),
        )));
        controller.lock().await.begin_preview()?;

        // Preview loop: the overlay cursor and the composite tick are
        // separate tasks on one scheduler, torn down together
        let mut scheduler = Scheduler::new();
        {
            let cursor = Arc::clone(&cursor);
            scheduler.spawn_periodic("overlay-cursor", overlay_delay, move || {
                let cursor = Arc::clone(&cursor);
                async move {
                    cursor.advance(overlay_len);
                    Ok(())
                }
            });
        }
        {
            let controller = Arc::clone(&controller);
            let surface = Arc::clone(&surface);
            scheduler.spawn_periodic("composite", TICK_PERIOD, move || {
                let controller = Arc::clone(&controller);
                let surface = Arc::clone(&surface);
                async move {
                    let frame = controller.lock().await.tick().await?;
                    surface.lock().await.present(&frame).await
                }
            });
        }

        tokio::time::sleep(self.config.preview_duration).await;

        // Capture. The composite task keeps running while recording so the
        // encoded frames are exactly the presented frames; it is shut down
        // before review.
        let kind = self.config.capture_kind;
        match kind {
            MediaKind::Image => {
                controller.lock().await.capture_photo().await?;
                self.client
                    .record_detached(&self.params.access_id, booth_models::CounterField::TakePhoto);
            }
            MediaKind::Video => {
                controller.lock().await.start_recording().await?;
                tokio::time::sleep(self.config.record_duration).await;
                controller.lock().await.stop_recording().await?;
                self.client
                    .record_detached(&self.params.access_id, booth_models::CounterField::TakeVideo);
            }
        }

        scheduler.shutdown().await;

        // Review ends in share for the scripted kiosk flow
        let media = controller.lock().await.finish().await?;
        let outcome = self
            .gateway
            .share(&self.params, &self.artist.name, media.kind, &media.path);
        // The counter tracks the share action itself; the upload gate only
        // controls storage
        self.client
            .record_detached(&self.params.access_id, booth_models::CounterField::SaveAndShare);

        if !outcome.upload_started {
            info!("Upload skipped by consent/age gate");
        }

        info!(path = %outcome.local_path.display(), "Session complete");
        Ok(outcome)
    }
}
