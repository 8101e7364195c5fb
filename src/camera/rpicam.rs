//! Raspberry Pi camera via the `rpicam-still` command line tool

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;

use super::{CaptureMode, FrameSource};
use crate::{Error, Result};

/// Tools tried in order when no command is configured
const CANDIDATES: &[&str] = &["rpicam-still", "libcamera-still"];

const PREVIEW_RESOLUTION: (u32, u32) = (1640, 1232);
const STILL_RESOLUTION: (u32, u32) = (3280, 2464);

const GRAB_TIMEOUT: Duration = Duration::from_secs(10);

/// Frame source backed by `rpicam-still`
pub struct RpicamSource {
    index: usize,
    program: PathBuf,
    label: String,
    mode: Mutex<CaptureMode>,
}

impl RpicamSource {
    /// Locate the capture tool for sensor `index`
    ///
    /// # Errors
    ///
    /// Returns `CameraUnavailable` if no capture tool is on `PATH`
    pub fn new(index: usize, command: Option<&str>) -> Result<Self> {
        let program = match command {
            Some(command) => which::which(command).map_err(|e| {
                Error::CameraUnavailable(format!("{command}: {e}"))
            })?,
            None => CANDIDATES
                .iter()
                .find_map(|bin| which::which(bin).ok())
                .ok_or_else(|| {
                    Error::CameraUnavailable(format!("none of {} found", CANDIDATES.join(", ")))
                })?,
        };

        tracing::debug!(index, program = %program.display(), "using rpicam capture tool");

        Ok(Self {
            index,
            program,
            label: format!("rpicam:{index}"),
            mode: Mutex::new(CaptureMode::Preview),
        })
    }

    fn args(&self, mode: CaptureMode) -> Vec<String> {
        let (width, height) = match mode {
            CaptureMode::Preview => PREVIEW_RESOLUTION,
            CaptureMode::Still => STILL_RESOLUTION,
        };
        vec![
            "--camera".to_string(),
            self.index.to_string(),
            "--nopreview".to_string(),
            "--immediate".to_string(),
            "--width".to_string(),
            width.to_string(),
            "--height".to_string(),
            height.to_string(),
            "--encoding".to_string(),
            "jpg".to_string(),
            "--output".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl FrameSource for RpicamSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn configure(&self, mode: CaptureMode) -> Result<()> {
        // Each grab is a fresh process, so switching is bookkeeping only
        if let Ok(mut current) = self.mode.lock() {
            *current = mode;
        }
        tracing::trace!(camera = %self.label, ?mode, "configured");
        Ok(())
    }

    async fn grab(&self, mode: CaptureMode) -> Result<DynamicImage> {
        let configured = self.mode.lock().map_or(mode, |m| *m);
        if configured != mode {
            tracing::debug!(camera = %self.label, ?configured, ?mode, "grabbing outside configured mode");
        }

        let output = tokio::time::timeout(
            GRAB_TIMEOUT,
            tokio::process::Command::new(&self.program)
                .args(self.args(mode))
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| Error::Camera(format!("{} timed out after {GRAB_TIMEOUT:?}", self.label)))?
        .map_err(|e| Error::Camera(format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(camera = %self.label, stderr = %stderr, "capture tool stderr");
            return Err(Error::Camera(format!(
                "{} exited with code {}",
                self.label,
                output.status.code().unwrap_or(-1)
            )));
        }

        Ok(image::load_from_memory(&output.stdout)?)
    }
}
