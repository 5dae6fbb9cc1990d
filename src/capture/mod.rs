//! Screen and webcam frame providers.
//!
//! Acquisition itself belongs to the host platform; the monitor only sees
//! these capabilities.

use anyhow::Result;
use async_trait::async_trait;

use crate::perception::CaptureFrame;

#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Ask the user for screen-share permission. `false` means denied.
    async fn request_access(&self) -> bool;

    /// Grab the current screen. `Ok(None)` when no frame is available yet.
    async fn capture_frame(&self) -> Result<Option<CaptureFrame>>;

    /// Stop the capture stream.
    async fn release(&self);
}

#[async_trait]
pub trait WebcamCapture: Send + Sync {
    async fn request_access(&self) -> bool;

    /// Latest frame from the live video source.
    async fn current_frame(&self) -> Result<Option<CaptureFrame>>;

    async fn release(&self);
}

/// Webcam provider for hosts without a camera. Always denies access.
pub struct NoWebcam;

#[async_trait]
impl WebcamCapture for NoWebcam {
    async fn request_access(&self) -> bool {
        false
    }

    async fn current_frame(&self) -> Result<Option<CaptureFrame>> {
        Ok(None)
    }

    async fn release(&self) {}
}
