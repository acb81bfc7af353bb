use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbImage};

/// Extensions the file picker accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// The single `file` part of a detection request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a jpg/jpeg/png file; anything else is rejected before any request is made.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::new(file_name, mime_type, bytes))
    }

    /// A JPEG frame straight from the camera.
    pub fn camera_frame(jpeg: Vec<u8>) -> Self {
        Self::new("frame.jpg", ImageFormat::Jpeg.to_mime_type(), jpeg)
    }

    /// Decodes the bytes into the pixel buffer used for preview and annotation.
    pub fn decode(&self) -> Result<RgbImage> {
        let img = image::load_from_memory(&self.bytes)
            .with_context(|| format!("decoding {}", self.file_name))?;
        Ok(img.to_rgb8())
    }
}

pub fn mime_for_path(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(anyhow!(
            "unsupported file type {:?} (expected one of {})",
            ext,
            ACCEPTED_EXTENSIONS.join(", ")
        ));
    }
    let format = ImageFormat::from_extension(&ext)
        .ok_or_else(|| anyhow!("unknown image extension {ext}"))?;
    Ok(format.to_mime_type())
}
