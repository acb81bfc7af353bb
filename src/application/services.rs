use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use tracing::{debug, error, info, warn};

use crate::{
    application::ports::{DetectorPort, FrameSourcePort, RendererPort},
    domain::{
        errors::DetectError,
        report::{summarize_detections, Presentation, Status},
        upload::ImageUpload,
    },
};

/// One user action: submit an image, then build what gets displayed.
///
/// Holds no per-request state; every call starts from its own image and
/// returns its own [`Presentation`].
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    renderer: Arc<dyn RendererPort>,
}

impl DetectionService {
    pub fn new(detector: Arc<dyn DetectorPort>, renderer: Arc<dyn RendererPort>) -> Self {
        Self { detector, renderer }
    }

    /// Upload flow: decode for the preview, submit, and optionally annotate.
    pub async fn run(&self, upload: &ImageUpload, annotate: bool) -> Presentation {
        match upload.decode() {
            Ok(image) => self.run_with_image(upload, image, annotate).await,
            Err(e) => {
                let err = DetectError::Unexpected(format!("{e:#}"));
                error!("{}", err);
                Presentation::failed(upload.file_name.clone(), None, err)
            }
        }
    }

    /// Submits `upload` and, if asked, draws the response over `image`.
    /// `image` is consumed: annotation is destructive.
    pub async fn run_with_image(&self, upload: &ImageUpload, mut image: RgbImage, annotate: bool) -> Presentation {
        let preview_size = Some(image.dimensions());
        info!(
            "Running inference on {} ({}x{}, {} bytes)...",
            upload.file_name,
            image.width(),
            image.height(),
            upload.bytes.len()
        );

        let outcome = match self.detector.detect(upload).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("{}", err);
                return Presentation::failed(upload.file_name.clone(), preview_size, err);
            }
        };

        let detections = &outcome.response.detections;
        if detections.is_empty() {
            info!("No detections for {}", upload.file_name);
        } else {
            info!("Detected {}", summarize_detections(detections));
        }

        let (annotated, rendered) = if annotate {
            let rendered = self.renderer.annotate(&mut image, &outcome.response);
            debug!("Rendered {} of {} detections", rendered, detections.len());
            ((rendered > 0).then_some(image), rendered)
        } else {
            (None, 0)
        };

        Presentation {
            source_name: upload.file_name.clone(),
            preview_size,
            status: Status::Success { elapsed_secs: outcome.process_time_secs },
            raw_json: Some(outcome.raw),
            annotated,
            rendered,
        }
    }

    /// Camera flow: every captured frame is submitted automatically and
    /// annotated. Capture errors are logged and the frame is skipped.
    pub async fn run_camera<F>(
        &self,
        source: &mut dyn FrameSourcePort,
        frames: u32,
        interval: Duration,
        mut on_frame: F,
    ) where
        F: FnMut(u32, Presentation),
    {
        for index in 0..frames {
            if index > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            let frame = match tokio::task::block_in_place(|| source.next_frame()) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Error capturing frame {}: {:#}", index, e);
                    continue;
                }
            };
            let upload = ImageUpload::camera_frame(frame.jpeg);
            let presentation = self.run_with_image(&upload, frame.rgb, true).await;
            on_frame(index, presentation);
        }
    }
}
