//! Spin-phase outcome randomizer.
//!
//! One weighted draw per session picks the normal or secret sequence. The
//! sequence is fully preloaded before the first frame shows (no partial
//! flicker), played once end to end on its ease curve, and a secret outcome
//! chains into the congratulations sequence before the capture phase opens.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::watch;
use tracing::info;

use booth_models::sequence::spin;
use booth_models::AnimationSequence;

use crate::assets::AssetCache;
use crate::error::{MediaError, MediaResult};
use crate::surface::Surface;

/// Spin outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Normal,
    Secret,
}

/// Outcome probability policy.
#[derive(Debug, Clone, Copy)]
pub struct SpinPolicy {
    /// Probability of the secret outcome, in `0.0..=1.0`
    pub secret_probability: f64,
}

impl Default for SpinPolicy {
    fn default() -> Self {
        // 80/20 split
        Self {
            secret_probability: 0.2,
        }
    }
}

impl SpinPolicy {
    pub fn new(secret_probability: f64) -> MediaResult<Self> {
        if !(0.0..=1.0).contains(&secret_probability) {
            return Err(MediaError::internal(format!(
                "secret probability {secret_probability} outside 0..=1"
            )));
        }
        Ok(Self { secret_probability })
    }

    /// Draw the session outcome.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Outcome {
        if rng.random::<f64>() < self.secret_probability {
            Outcome::Secret
        } else {
            Outcome::Normal
        }
    }
}

/// Plays the spin phase.
pub struct SpinRunner {
    policy: SpinPolicy,
    cache: Arc<AssetCache>,
}

impl SpinRunner {
    pub fn new(policy: SpinPolicy, cache: Arc<AssetCache>) -> Self {
        Self { policy, cache }
    }

    /// Run the spin phase to completion.
    ///
    /// Returns the drawn outcome once the capture phase may start. A cancel
    /// signal stops playback between frames.
    pub async fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        surface: &mut dyn Surface,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<Outcome> {
        let outcome = self.policy.draw(rng);
        info!(outcome = ?outcome, "Spin outcome drawn");

        let sequence = match outcome {
            Outcome::Normal => spin::normal(),
            Outcome::Secret => spin::secret(),
        };
        self.play(&sequence, surface, cancel).await?;

        if outcome == Outcome::Secret {
            let congrats = spin::congratulations();
            self.play(&congrats, surface, cancel).await?;
        }

        Ok(outcome)
    }

    /// Preload and play one sequence end to end.
    async fn play(
        &self,
        sequence: &AnimationSequence,
        surface: &mut dyn Surface,
        cancel: &watch::Receiver<bool>,
    ) -> MediaResult<()> {
        let frames = self.cache.load_sequence(sequence).await?;

        for index in 0..frames.len() {
            if *cancel.borrow() {
                return Ok(());
            }
            surface.present(frames.frame(index)).await?;
            tokio::time::sleep(sequence.delay(index)).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_policy_rejects_bad_probability() {
        assert!(SpinPolicy::new(1.5).is_err());
        assert!(SpinPolicy::new(-0.1).is_err());
        assert!(SpinPolicy::new(0.3).is_ok());
    }

    #[test]
    fn test_outcome_distribution_converges() {
        // 10k seeded trials: observed secret rate within ~4 standard errors
        // of p (se = sqrt(p*(1-p)/n) ~ 0.004 at p=0.2)
        let policy = SpinPolicy::default();
        let mut rng = StdRng::seed_from_u64(42);

        let n = 10_000;
        let secrets = (0..n)
            .filter(|_| policy.draw(&mut rng) == Outcome::Secret)
            .count();
        let rate = secrets as f64 / n as f64;
        assert!(
            (rate - 0.2).abs() < 0.016,
            "secret rate {rate} too far from 0.2"
        );
    }

    #[test]
    fn test_alternate_split() {
        // 70/30 variant
        let policy = SpinPolicy::new(0.3).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 10_000;
        let secrets = (0..n)
            .filter(|_| policy.draw(&mut rng) == Outcome::Secret)
            .count();
        let rate = secrets as f64 / n as f64;
        assert!((rate - 0.3).abs() < 0.019, "secret rate {rate} too far from 0.3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_secret_run_chains_congratulations() {
        use crate::assets::AssetCacheConfig;
        use crate::surface::CollectingSurface;

        let dir = tempfile::tempdir().unwrap();
        for seq in [spin::secret(), spin::congratulations()] {
            for path in seq.frames() {
                let full = dir.path().join(path);
                std::fs::create_dir_all(full.parent().unwrap()).unwrap();
                image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]))
                    .save(&full)
                    .unwrap();
            }
        }

        let cache = Arc::new(AssetCache::new(AssetCacheConfig::new(dir.path())));
        let runner = SpinRunner::new(SpinPolicy::new(1.0).unwrap(), cache);
        let mut surface = CollectingSurface::default();
        let (_tx, cancel) = watch::channel(false);
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = runner.run(&mut rng, &mut surface, &cancel).await.unwrap();
        assert_eq!(outcome, Outcome::Secret);
        // Full secret sequence plus the congratulations chain
        assert_eq!(
            surface.frames.len(),
            spin::SPIN_FRAME_COUNT + spin::CONGRATS_FRAME_COUNT
        );
    }

    #[test]
    fn test_extreme_probabilities() {
        let mut rng = StdRng::seed_from_u64(1);
        let never = SpinPolicy::new(0.0).unwrap();
        assert!((0..100).all(|_| never.draw(&mut rng) == Outcome::Normal));

        let always = SpinPolicy::new(1.0).unwrap();
        assert!((0..100).all(|_| always.draw(&mut rng) == Outcome::Secret));
    }
}
