//! Tick scheduling and cooperative cancellation.
//!
//! One `Scheduler` drives a phase. Animation advancement and
//! segment-and-composite work run as separate subscribed tasks sharing one
//! cancel signal, so a phase transition tears everything down together.
//! A loop that outlives its phase keeps drawing stale overlays, which is a
//! correctness bug, not a leak.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Compositor tick period (~30 Hz).
pub const TICK_PERIOD: Duration = Duration::from_millis(33);

/// Shared overlay frame cursor.
///
/// Single-writer discipline: exactly one clock task advances or resets it;
/// everyone else only reads. That is what makes the lock-free counter safe.
#[derive(Debug, Default)]
pub struct FrameCursor {
    index: AtomicUsize,
}

impl FrameCursor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current frame index wrapped to a sequence of `len` frames.
    pub fn current(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.index.load(Ordering::Relaxed) % len
    }

    /// Advance by one frame, wrapping modulo `len`. Returns the new index.
    pub fn advance(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.index.fetch_add(1, Ordering::Relaxed) + 1) % len
    }

    /// Reset to frame 0 (retake path).
    pub fn reset(&self) {
        self.index.store(0, Ordering::Relaxed);
    }
}

/// Spawns periodic tasks tied to one cancel signal.
pub struct Scheduler {
    cancel_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            cancel_tx,
            handles: Vec::new(),
        }
    }

    /// A receiver for the shared cancel signal.
    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    /// Spawn a periodic task.
    ///
    /// The body runs to completion each tick before the next fires; a tick
    /// that arrives while the previous body is still running is skipped
    /// rather than queued, which throttles work to the period regardless of
    /// how long a body takes.
    pub fn spawn_periodic<F, Fut>(&mut self, name: &'static str, period: Duration, mut body: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = MediaResult<()>> + Send,
    {
        let mut cancel_rx = self.cancel_tx.subscribe();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_done: Option<Instant> = None;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // Skip if the previous body finished under a period
                        // ago (Skip behavior covers the over-budget case;
                        // this covers the immediate-fire-after-delay case)
                        if let Some(done) = last_done {
                            if done.elapsed() < period {
                                continue;
                            }
                        }
                        if let Err(e) = body().await {
                            warn!(task = name, "Tick failed: {e}");
                        }
                        last_done = Some(Instant::now());
                    }
                    changed = cancel_rx.changed() => {
                        // A dropped sender cancels too
                        if changed.is_err() || *cancel_rx.borrow() {
                            debug!(task = name, "Tick task cancelled");
                            break;
                        }
                    }
                }
            }
        });
        self.handles.push(handle);
    }

    /// Cancel every task and wait for them to finish.
    pub async fn shutdown(mut self) {
        let _ = self.cancel_tx.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Best effort if shutdown() was skipped; tasks observe the signal
        // on their next tick.
        let _ = self.cancel_tx.send(true);
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_cursor_wraps() {
        let cursor = FrameCursor::new();
        for _ in 0..29 {
            cursor.advance(30);
        }
        assert_eq!(cursor.current(30), 29);
        assert_eq!(cursor.advance(30), 0);
        assert_eq!(cursor.current(30), 0);
    }

    #[test]
    fn test_cursor_reset() {
        let cursor = FrameCursor::new();
        cursor.advance(10);
        cursor.advance(10);
        cursor.reset();
        assert_eq!(cursor.current(10), 0);
    }

    #[test]
    fn test_cursor_empty_sequence() {
        let cursor = FrameCursor::new();
        assert_eq!(cursor.advance(0), 0);
        assert_eq!(cursor.current(0), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_task_ticks_and_cancels() {
        let count = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();

        let counter = Arc::clone(&count);
        scheduler.spawn_periodic("count", Duration::from_millis(10), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        scheduler.shutdown().await;

        let ticked = count.load(Ordering::SeqCst);
        assert!(ticked >= 4, "expected several ticks, got {ticked}");

        // No further ticks after shutdown
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), ticked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_tasks_cancel_together() {
        let a = Arc::new(AtomicU32::new(0));
        let b = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new();

        for counter in [Arc::clone(&a), Arc::clone(&b)] {
            scheduler.spawn_periodic("task", Duration::from_millis(10), move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        tokio::time::sleep(Duration::from_millis(35)).await;
        scheduler.shutdown().await;

        assert!(a.load(Ordering::SeqCst) > 0);
        assert!(b.load(Ordering::SeqCst) > 0);
    }
}
