use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info};

use crate::application::ports::RendererPort;
use crate::domain::detection::{DetectionResponse, DetectionResult};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.75;
/// Labels sit this many pixels above the box top, unclamped.
pub const LABEL_OFFSET_Y: i32 = 10;

const SYSTEM_FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// How detections are drawn.
pub struct AnnotationStyle {
    /// Only detections scoring strictly above this are drawn.
    pub threshold: f32,
    /// Outline width in pixels, drawn inward from the box edge.
    pub stroke_width: u32,
    pub color: Rgb<u8>,
    pub font_scale: f32,
    /// Without a font, boxes are drawn and labels skipped.
    pub font: Option<FontVec>,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            stroke_width: 3,
            color: Rgb([255, 0, 0]),
            font_scale: 16.0,
            font: None,
        }
    }
}

impl AnnotationStyle {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_font_path(mut self, font_path: &Path) -> Result<Self> {
        let data = std::fs::read(font_path).with_context(|| format!("reading font {}", font_path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| anyhow!("failed to parse font file {}", font_path.display()))?;
        self.font = Some(font);
        Ok(self)
    }

    /// First font found in the usual system locations, if any.
    pub fn with_system_font(mut self) -> Self {
        for path in SYSTEM_FONT_PATHS {
            if let Ok(data) = std::fs::read(path) {
                if let Ok(font) = FontVec::try_from_vec(data) {
                    info!("Loaded system font: {}", path);
                    self.font = Some(font);
                    return self;
                }
            }
        }
        debug!("No system font found, labels will be skipped");
        self
    }
}

/// One overlay: the outline rectangle and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub rect: Rect,
    pub label: String,
    pub label_origin: (i32, i32),
}

impl Annotation {
    fn for_detection(det: &DetectionResult) -> Self {
        let b = &det.bbox;
        let left = b.left.round() as i32;
        let top = b.top.round() as i32;
        let width = (b.right - b.left).round().max(1.0) as u32;
        let height = (b.bottom - b.top).round().max(1.0) as u32;
        Self {
            rect: Rect::at(left, top).of_size(width, height),
            label: det.label(),
            label_origin: (left, top - LABEL_OFFSET_Y),
        }
    }
}

/// Overlays for every detection above `threshold`, in response order.
pub fn plan_annotations(response: &DetectionResponse, threshold: f32) -> Vec<Annotation> {
    response.above(threshold).map(Annotation::for_detection).collect()
}

pub struct Annotator {
    style: AnnotationStyle,
}

impl Annotator {
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }

    fn draw(&self, image: &mut RgbImage, annotation: &Annotation) {
        let rect = annotation.rect;
        for i in 0..self.style.stroke_width as i64 {
            let w = rect.width() as i64 - 2 * i;
            let h = rect.height() as i64 - 2 * i;
            if w <= 0 || h <= 0 {
                break;
            }
            let inner = Rect::at(rect.left() + i as i32, rect.top() + i as i32).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, inner, self.style.color);
        }

        match &self.style.font {
            Some(font) => {
                let (x, y) = annotation.label_origin;
                draw_text_mut(
                    image,
                    self.style.color,
                    x,
                    y,
                    PxScale::from(self.style.font_scale),
                    font,
                    &annotation.label,
                );
            }
            None => debug!("No font loaded, skipping label {:?}", annotation.label),
        }
    }
}

impl RendererPort for Annotator {
    /// Draws in place; with nothing above the threshold the image is untouched.
    fn annotate(&self, image: &mut RgbImage, response: &DetectionResponse) -> usize {
        let plan = plan_annotations(response, self.style.threshold);
        for annotation in &plan {
            self.draw(image, annotation);
        }
        plan.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];
    const BLACK: [u8; 3] = [0, 0, 0];

    fn response(dets: &[([f32; 4], &str, f32)]) -> DetectionResponse {
        DetectionResponse {
            detections: dets
                .iter()
                .map(|&(bbox, name, confidence)| DetectionResult {
                    bbox: bbox.into(),
                    class_name: name.into(),
                    confidence,
                })
                .collect(),
        }
    }

    fn annotator() -> Annotator {
        Annotator::new(AnnotationStyle::default())
    }

    #[test]
    fn empty_response_leaves_image_identical() {
        let mut img = RgbImage::from_fn(16, 16, |x, y| Rgb([x as u8, y as u8, 7]));
        let before = img.clone();
        assert_eq!(annotator().annotate(&mut img, &DetectionResponse::default()), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn threshold_boundary_is_excluded() {
        let mut img = RgbImage::new(20, 20);
        let before = img.clone();
        let resp = response(&[([2.0, 2.0, 12.0, 12.0], "dog", 0.75), ([0.0, 0.0, 5.0, 5.0], "cat", 0.3)]);
        assert_eq!(annotator().annotate(&mut img, &resp), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn draws_outline_with_stroke_width() {
        let mut img = RgbImage::new(20, 20);
        let resp = response(&[([2.0, 2.0, 12.0, 12.0], "dog", 0.9)]);
        assert_eq!(annotator().annotate(&mut img, &resp), 1);

        assert_eq!(img.get_pixel(2, 2).0, RED);
        assert_eq!(img.get_pixel(11, 11).0, RED);
        assert_eq!(img.get_pixel(4, 7).0, RED);
        assert_eq!(img.get_pixel(5, 7).0, BLACK);
        assert_eq!(img.get_pixel(7, 7).0, BLACK);
        assert_eq!(img.get_pixel(1, 1).0, BLACK);
        assert_eq!(img.get_pixel(12, 12).0, BLACK);
    }

    #[test]
    fn plan_has_one_entry_per_passing_detection() {
        let resp = response(&[
            ([10.0, 30.0, 50.0, 80.0], "person", 0.876),
            ([0.0, 0.0, 4.0, 4.0], "cup", 0.75),
            ([5.0, 3.0, 9.0, 9.0], "dog", 0.99),
        ]);
        let plan = plan_annotations(&resp, 0.75);
        assert_eq!(plan.len(), 2);

        assert_eq!(plan[0].label, "person  (0.88)");
        assert_eq!(plan[0].rect, Rect::at(10, 30).of_size(40, 50));
        assert_eq!(plan[0].label_origin, (10, 20));

        // Near the top edge the label goes off-image rather than being clamped.
        assert_eq!(plan[1].label, "dog  (0.99)");
        assert_eq!(plan[1].label_origin, (5, -7));
    }

    #[test]
    fn configurable_threshold() {
        let resp = response(&[([0.0, 0.0, 4.0, 4.0], "cup", 0.5)]);
        assert!(plan_annotations(&resp, DEFAULT_CONFIDENCE_THRESHOLD).is_empty());
        let annotator = Annotator::new(AnnotationStyle::default().with_threshold(0.4));
        let mut img = RgbImage::new(8, 8);
        assert_eq!(annotator.annotate(&mut img, &resp), 1);
    }

    #[test]
    fn degenerate_box_still_draws() {
        let mut img = RgbImage::new(8, 8);
        let resp = response(&[([3.0, 3.0, 3.0, 3.0], "dot", 0.9)]);
        assert_eq!(annotator().annotate(&mut img, &resp), 1);
        assert_eq!(img.get_pixel(3, 3).0, RED);
    }

    #[test]
    fn label_lands_in_band_above_box() {
        let mut style = AnnotationStyle::default().with_system_font();
        if style.font.is_none() {
            eprintln!("no system font available, skipping label rendering check");
            return;
        }
        style.stroke_width = 1;
        style.font_scale = 10.0;
        let annotator = Annotator::new(style);

        let mut img = RgbImage::new(80, 80);
        let resp = response(&[
            ([10.0, 30.0, 50.0, 50.0], "dog", 0.91),
            ([10.0, 70.0, 40.0, 78.0], "cat", 0.5),
        ]);
        assert_eq!(annotator.annotate(&mut img, &resp), 1);

        let lit = |y: u32| (0..img.width()).filter(|&x| img.get_pixel(x, y).0 != BLACK).count();
        // Nothing above the label band of the drawn detection.
        assert!((0..20).all(|y| lit(y) == 0));
        // Label pixels between top - 10 and the box top.
        assert!((20..30).map(lit).sum::<usize>() > 0);
        // The skipped detection has neither label nor box.
        assert!((60..80).all(|y| lit(y) == 0));
    }

    #[test]
    fn bad_font_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-font.ttf");
        std::fs::write(&path, b"nope").unwrap();
        assert!(AnnotationStyle::default().with_font_path(&path).is_err());
        assert!(AnnotationStyle::default().with_font_path(&dir.path().join("missing.ttf")).is_err());
    }
}
