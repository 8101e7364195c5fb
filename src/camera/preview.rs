//! Live preview sampling
//!
//! A background task grabs preview frames at roughly 30 Hz and publishes
//! them through a single-slot channel. The producer never blocks: a frame
//! the consumer has not picked up yet is simply replaced by the next one.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use image::imageops::FilterType;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Camera;

/// Preview frame width
pub const PREVIEW_WIDTH: u32 = 426;

/// Preview frame height
pub const PREVIEW_HEIGHT: u32 = 240;

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

type Slot = Option<Arc<DynamicImage>>;

/// Background frame producer; stops when dropped
pub struct PreviewSampler {
    task: JoinHandle<()>,
}

/// Consumer side of the preview slot
pub struct PreviewFeed {
    rx: watch::Receiver<Slot>,
}

impl PreviewSampler {
    /// Start sampling `camera`
    #[must_use]
    pub fn spawn(camera: Arc<Camera>) -> (Self, PreviewFeed) {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(camera, tx));
        (Self { task }, PreviewFeed { rx })
    }

    /// Stop sampling
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for PreviewSampler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(camera: Arc<Camera>, tx: watch::Sender<Slot>) {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(camera = camera.number(), "preview sampler started");

    loop {
        ticker.tick().await;

        if tx.is_closed() {
            break;
        }

        match camera.try_grab_preview().await {
            // A capture owns the sensor; skip this tick
            None => {}
            Some(Ok(frame)) => {
                tx.send_replace(Some(Arc::new(shrink(&frame))));
            }
            Some(Err(e)) => {
                tracing::debug!(camera = camera.number(), error = %e, "preview grab failed");
            }
        }
    }

    tracing::debug!(camera = camera.number(), "preview sampler stopped");
}

/// Mirror and shrink a frame for display
#[must_use]
pub fn shrink(frame: &DynamicImage) -> DynamicImage {
    frame
        .fliph()
        .resize_exact(PREVIEW_WIDTH, PREVIEW_HEIGHT, FilterType::Triangle)
}

impl PreviewFeed {
    /// Take the newest unseen frame, if any
    pub fn latest(&mut self) -> Option<Arc<DynamicImage>> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }
}
