use serde::{Deserialize, Serialize};

/// Axis-aligned box in source-image pixels, sent on the wire as
/// `[left, top, right, bottom]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl From<[f32; 4]> for BoundingBox {
    fn from([left, top, right, bottom]: [f32; 4]) -> Self {
        Self { left, top, right, bottom }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.left, b.top, b.right, b.bottom]
    }
}

impl BoundingBox {
    pub fn is_finite(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionResult {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub class_name: String,
    pub confidence: f32,
}

impl DetectionResult {
    /// Text drawn next to the box, e.g. `dog  (0.91)`.
    pub fn label(&self) -> String {
        format!("{}  ({:.2})", self.class_name, self.confidence)
    }
}

/// Body of a successful `POST /detect/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionResponse {
    pub detections: Vec<DetectionResult>,
}

impl DetectionResponse {
    /// Checks what serde cannot: finite coordinates and a confidence in [0, 1].
    pub fn validate(&self) -> Result<(), String> {
        for (i, det) in self.detections.iter().enumerate() {
            if !det.bbox.is_finite() {
                return Err(format!("detection {i} ({}) has a non-finite box", det.class_name));
            }
            if !(0.0..=1.0).contains(&det.confidence) {
                return Err(format!(
                    "detection {i} ({}) has confidence {} outside [0, 1]",
                    det.class_name, det.confidence
                ));
            }
        }
        Ok(())
    }

    /// Detections strictly above `threshold`, in response order.
    pub fn above(&self, threshold: f32) -> impl Iterator<Item = &DetectionResult> {
        self.detections.iter().filter(move |d| d.confidence > threshold)
    }
}
