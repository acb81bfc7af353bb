use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{
    camera::CapturedFrame,
    detection::DetectionResponse,
    errors::DetectResult,
    report::DetectionOutcome,
    upload::ImageUpload,
};

/// Remote detection endpoint. One call is one best-effort attempt, no retries.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, upload: &ImageUpload) -> DetectResult<DetectionOutcome>;
}

/// Draws detections onto an image in place and returns how many were drawn.
pub trait RendererPort: Send + Sync {
    fn annotate(&self, image: &mut RgbImage, response: &DetectionResponse) -> usize;
}

/// Blocking source of camera frames.
pub trait FrameSourcePort {
    fn next_frame(&mut self) -> anyhow::Result<CapturedFrame>;
}
