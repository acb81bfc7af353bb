use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::domain::report::Presentation;

/// Prints one action's preview line, status and raw JSON.
pub fn print_presentation(p: &Presentation, out: &mut impl Write) -> io::Result<()> {
    match p.preview_size {
        Some((w, h)) => writeln!(out, "Image: {} ({}x{})", p.source_name, w, h)?,
        None => writeln!(out, "Image: {}", p.source_name)?,
    }

    let message = p.status.message();
    if p.status.is_success() {
        info!("{}", message);
    } else {
        error!("{}", message);
    }
    writeln!(out, "{}", message)?;

    if let Some(raw) = &p.raw_json {
        writeln!(out)?;
        writeln!(out, "Detection Results (JSON)")?;
        let pretty = serde_json::to_string_pretty(raw).map_err(io::Error::other)?;
        writeln!(out, "{}", pretty)?;
    }
    Ok(())
}

/// Writes the annotated image if there is one. Returns whether a file was written.
pub fn save_annotated(p: &Presentation, path: &Path) -> Result<bool> {
    let Some(img) = &p.annotated else {
        info!("No detection above threshold, nothing drawn for {}", p.source_name);
        return Ok(false);
    };
    if let Some(parent) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path).with_context(|| format!("writing {}", path.display()))?;
    info!("Annotated image ({} boxes) written to {}", p.rendered, path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{errors::DetectError, report::Status};
    use image::RgbImage;
    use serde_json::json;

    fn success(annotated: Option<RgbImage>) -> Presentation {
        Presentation {
            source_name: "cat.png".into(),
            preview_size: Some((4, 3)),
            status: Status::Success { elapsed_secs: None },
            raw_json: Some(json!({ "detections": [] })),
            rendered: usize::from(annotated.is_some()),
            annotated,
        }
    }

    #[test]
    fn prints_preview_status_and_json() {
        let mut out = Vec::new();
        print_presentation(&success(None), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Image: cat.png (4x3)\nInference complete.\n"));
        assert!(text.contains("Detection Results (JSON)"));
        assert!(text.contains("\"detections\": []"));
    }

    #[test]
    fn failure_prints_message_without_json() {
        let p = Presentation::failed("cat.png", None, DetectError::Api { status: 404, body: "not found".into() });
        let mut out = Vec::new();
        print_presentation(&p, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Image: cat.png\nError from API: 404 - not found\n");
    }

    #[test]
    fn saves_only_when_annotated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/annotated.png");
        assert!(!save_annotated(&success(None), &path).unwrap());
        assert!(!path.exists());

        assert!(save_annotated(&success(Some(RgbImage::new(4, 3))), &path).unwrap());
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (4, 3));
    }
}
