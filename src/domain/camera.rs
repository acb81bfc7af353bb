// src/domain/camera.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraId {
    pub path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Requested capture mode; the driver may settle on the nearest supported one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraMode {
    pub format: String,
    pub size: FrameSize,
    pub fps: u32,
}

impl Default for CameraMode {
    fn default() -> Self {
        Self {
            format: "MJPG".into(),
            size: FrameSize { width: 640, height: 480 },
            fps: 30,
        }
    }
}

/// One frame off the camera: decoded pixels for drawing, JPEG for the upload.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub rgb: image::RgbImage,
    pub jpeg: Vec<u8>,
}
