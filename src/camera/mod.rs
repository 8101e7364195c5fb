//! Camera capture
//!
//! A [`Camera`] wraps a [`FrameSource`] and turns raw frames into the two
//! files the assistant needs: a timestamped high resolution photo in the
//! pictures directory, and a fixed 512×512 analysis image in the work
//! directory that gets overwritten on every capture.

mod preview;
mod rpicam;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

pub use preview::{PREVIEW_HEIGHT, PREVIEW_WIDTH, PreviewFeed, PreviewSampler};
pub use rpicam::RpicamSource;

use crate::Result;
use crate::command::CameraId;
use crate::config::CameraConfig;

/// Side length of the analysis image
pub const ANALYSIS_SIZE: u32 = 512;

const PHOTO_QUALITY: u8 = 95;
const ANALYSIS_QUALITY: u8 = 90;

/// Sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Low latency, reduced resolution
    Preview,
    /// Full sensor resolution
    Still,
}

/// Something that produces frames
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Human-readable device label
    fn label(&self) -> &str;

    /// Switch the sensor configuration
    async fn configure(&self, mode: CaptureMode) -> Result<()>;

    /// Grab a single frame in `mode`
    async fn grab(&self, mode: CaptureMode) -> Result<DynamicImage>;
}

/// A numbered camera with its output locations
pub struct Camera {
    number: u8,
    source: Arc<dyn FrameSource>,
    pictures_dir: PathBuf,
    work_dir: PathBuf,
    // Held while the sensor is reconfigured so preview grabs back off
    device: tokio::sync::Mutex<()>,
}

impl Camera {
    /// Create a camera writing into the given directories
    #[must_use]
    pub fn new(
        number: u8,
        source: Arc<dyn FrameSource>,
        pictures_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            number,
            source,
            pictures_dir: pictures_dir.into(),
            work_dir: work_dir.into(),
            device: tokio::sync::Mutex::new(()),
        }
    }

    /// Camera number (1 or 2)
    #[must_use]
    pub const fn number(&self) -> u8 {
        self.number
    }

    /// Underlying device label
    #[must_use]
    pub fn label(&self) -> &str {
        self.source.label()
    }

    /// Take a full resolution photo into the pictures directory
    ///
    /// The sensor is always put back into preview mode afterwards, whether
    /// or not the capture succeeded.
    pub async fn capture_high_res(&self) -> Option<PathBuf> {
        let _device = self.device.lock().await;

        let result = self.capture_still().await;

        if let Err(e) = self.source.configure(CaptureMode::Preview).await {
            tracing::warn!(camera = self.number, error = %e, "failed to restore preview mode");
        }

        match result {
            Ok(path) => {
                tracing::info!(camera = self.number, path = %path.display(), "photo saved");
                Some(path)
            }
            Err(e) => {
                tracing::error!(camera = self.number, error = %e, "high resolution capture failed");
                None
            }
        }
    }

    async fn capture_still(&self) -> Result<PathBuf> {
        self.source.configure(CaptureMode::Still).await?;
        let frame = self.source.grab(CaptureMode::Still).await?;

        std::fs::create_dir_all(&self.pictures_dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = self
            .pictures_dir
            .join(format!("Camera{}_{timestamp}.jpg", self.number));

        write_jpeg(&frame, &path, PHOTO_QUALITY)?;
        Ok(path)
    }

    /// Capture the 512×512 analysis image (`camera{n}.jpg` in the work dir)
    pub async fn capture_and_convert(&self) -> Option<PathBuf> {
        match self.capture_analysis().await {
            Ok(path) => {
                tracing::debug!(camera = self.number, path = %path.display(), "analysis image written");
                Some(path)
            }
            Err(e) => {
                tracing::error!(camera = self.number, error = %e, "analysis capture failed");
                None
            }
        }
    }

    async fn capture_analysis(&self) -> Result<PathBuf> {
        let frame = {
            let _device = self.device.lock().await;
            self.source.grab(CaptureMode::Preview).await?
        };

        let square = normalize_for_analysis(&frame);

        std::fs::create_dir_all(&self.work_dir)?;
        let path = self.work_dir.join(format!("camera{}.jpg", self.number));
        write_jpeg(&square, &path, ANALYSIS_QUALITY)?;
        Ok(path)
    }

    /// Grab a preview frame unless a capture currently owns the sensor
    pub(crate) async fn try_grab_preview(&self) -> Option<Result<DynamicImage>> {
        let _device = self.device.try_lock().ok()?;
        Some(self.source.grab(CaptureMode::Preview).await)
    }
}

/// Scale the short side to 512 and centre-crop to a square
#[must_use]
pub fn normalize_for_analysis(frame: &DynamicImage) -> DynamicImage {
    frame.resize_to_fill(ANALYSIS_SIZE, ANALYSIS_SIZE, FilterType::Lanczos3)
}

fn write_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> Result<()> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, quality).encode_image(&rgb)?;
    Ok(())
}

/// The set of attached cameras (at most two)
#[derive(Default)]
pub struct CameraRig {
    cameras: Vec<Arc<Camera>>,
}

impl CameraRig {
    /// Rig with no cameras
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a rig from already constructed cameras, numbered in order
    #[must_use]
    pub fn from_cameras(cameras: Vec<Arc<Camera>>) -> Self {
        if cameras.len() > 2 {
            tracing::warn!(count = cameras.len(), "only the first two cameras are used");
        }
        Self {
            cameras: cameras.into_iter().take(2).collect(),
        }
    }

    /// Detect rpicam cameras from configuration
    ///
    /// Missing tooling is not fatal: the rig simply comes up empty and the
    /// assistant reports "camera not initialized" when asked for a photo.
    #[must_use]
    pub fn detect(config: &CameraConfig) -> Self {
        let mut cameras = Vec::new();
        for index in 0..config.count.min(2) {
            let source = match RpicamSource::new(index, config.command.as_deref()) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(camera = index + 1, error = %e, "camera not available");
                    break;
                }
            };
            #[allow(clippy::cast_possible_truncation)]
            let number = index as u8 + 1;
            cameras.push(Arc::new(Camera::new(
                number,
                Arc::new(source),
                &config.pictures_dir,
                &config.work_dir,
            )));
        }

        tracing::info!(count = cameras.len(), "cameras initialized");
        Self { cameras }
    }

    /// Number of usable cameras
    #[must_use]
    pub fn count(&self) -> usize {
        self.cameras.len()
    }

    /// Camera for `id`, if attached
    #[must_use]
    pub fn get(&self, id: CameraId) -> Option<&Arc<Camera>> {
        self.cameras.get(usize::from(id.number()) - 1)
    }

    /// All attached cameras
    #[must_use]
    pub fn cameras(&self) -> &[Arc<Camera>] {
        &self.cameras
    }
}
