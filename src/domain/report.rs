use std::collections::BTreeMap;

use image::RgbImage;
use serde_json::Value;

use super::detection::{DetectionResponse, DetectionResult};
use super::errors::DetectError;

/// What a successful round trip hands back: the typed body, the body as
/// received (for the raw JSON view) and the server-reported time.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub response: DetectionResponse,
    pub raw: Value,
    pub process_time_secs: Option<f64>,
}

/// End state of one user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Success { elapsed_secs: Option<f64> },
    Failure(DetectError),
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Status::Success { elapsed_secs: Some(secs) } => {
                format!("Inference complete in {secs:.2} seconds.")
            }
            Status::Success { elapsed_secs: None } => "Inference complete.".to_string(),
            Status::Failure(err) => err.to_string(),
        }
    }
}

/// Everything shown for one action. Built fresh per action and never shared.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub source_name: String,
    pub preview_size: Option<(u32, u32)>,
    pub status: Status,
    pub raw_json: Option<Value>,
    /// Set only when annotation was requested and at least one detection passed.
    pub annotated: Option<RgbImage>,
    pub rendered: usize,
}

impl Presentation {
    pub fn failed(source_name: impl Into<String>, preview_size: Option<(u32, u32)>, err: DetectError) -> Self {
        Self {
            source_name: source_name.into(),
            preview_size,
            status: Status::Failure(err),
            raw_json: None,
            annotated: None,
            rendered: 0,
        }
    }
}

/// One-line tally such as `2 dog, 1 person`, sorted by label.
pub fn summarize_detections(detections: &[DetectionResult]) -> String {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(det.class_name.as_str()).or_insert(0usize) += 1;
    }
    counts
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_message_with_and_without_timing() {
        assert_eq!(
            Status::Success { elapsed_secs: Some(0.1234) }.message(),
            "Inference complete in 0.12 seconds."
        );
        assert_eq!(Status::Success { elapsed_secs: None }.message(), "Inference complete.");
    }

    #[test]
    fn failure_message_is_error_text() {
        let st = Status::Failure(DetectError::Api { status: 500, body: "boom".into() });
        assert!(!st.is_success());
        assert_eq!(st.message(), "Error from API: 500 - boom");
    }

    #[test]
    fn summary_counts_labels() {
        let det = |name: &str| DetectionResult {
            bbox: [0.0, 0.0, 1.0, 1.0].into(),
            class_name: name.into(),
            confidence: 0.9,
        };
        let dets = vec![det("dog"), det("person"), det("dog")];
        assert_eq!(summarize_detections(&dets), "2 dog, 1 person");
        assert_eq!(summarize_detections(&[]), "");
    }
}
