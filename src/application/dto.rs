use std::io::Cursor;

use base64::{prelude::BASE64_STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::report::{Presentation, Status};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectQuery {
    #[serde(default)]
    pub annotate: bool,
}

/// What the dashboard receives for one action. Handled failures are still a
/// 200 with `ok: false` so the page can show the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReply {
    pub ok: bool,
    pub message: String,
    pub elapsed_secs: Option<f64>,
    pub results: Option<Value>,
    pub rendered: usize,
    pub annotated_png_base64: Option<String>,
}

impl DetectReply {
    pub fn from_presentation(p: &Presentation) -> Result<Self, image::ImageError> {
        let elapsed_secs = match &p.status {
            Status::Success { elapsed_secs } => *elapsed_secs,
            Status::Failure(_) => None,
        };
        let annotated_png_base64 = match &p.annotated {
            Some(img) => {
                let mut buf = Vec::new();
                DynamicImage::ImageRgb8(img.clone()).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
                Some(BASE64_STANDARD.encode(buf))
            }
            None => None,
        };
        Ok(Self {
            ok: p.status.is_success(),
            message: p.status.message(),
            elapsed_secs,
            results: p.raw_json.clone(),
            rendered: p.rendered,
            annotated_png_base64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DetectError;
    use image::RgbImage;
    use serde_json::json;

    #[test]
    fn success_reply_embeds_png() {
        let p = Presentation {
            source_name: "frame.jpg".into(),
            preview_size: Some((3, 2)),
            status: Status::Success { elapsed_secs: Some(1.0) },
            raw_json: Some(json!({ "detections": [] })),
            annotated: Some(RgbImage::new(3, 2)),
            rendered: 1,
        };
        let reply = DetectReply::from_presentation(&p).unwrap();
        assert!(reply.ok);
        assert_eq!(reply.message, "Inference complete in 1.00 seconds.");
        let png = BASE64_STANDARD.decode(reply.annotated_png_base64.unwrap()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn failure_reply_has_message_only() {
        let p = Presentation::failed("a.png", None, DetectError::Transport("connection refused".into()));
        let reply = DetectReply::from_presentation(&p).unwrap();
        assert!(!reply.ok);
        assert_eq!(reply.message, "Could not connect to the API: connection refused");
        assert!(reply.results.is_none());
        assert!(reply.annotated_png_base64.is_none());
    }
}
