use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::adapters::api::client::DEFAULT_API_URL;
use crate::adapters::render::annotate::{AnnotationStyle, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::domain::camera::{CameraId, CameraMode, FrameSize};

/// Send images to an object-detection API and draw what comes back.
#[derive(Parser, Debug)]
#[command(name = "framesight", version, about)]
pub struct Cli {
    /// Base URL of the detection API; requests go to `{api_url}/detect/`.
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit an image file (jpg, jpeg, png) and print the raw results
    Upload(UploadArgs),
    /// Capture frames from a V4L2 camera; each frame is submitted automatically
    Camera(CameraArgs),
    /// Serve the browser dashboard (upload and camera panels)
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Only detections scoring strictly above this are drawn.
    #[arg(
        long,
        env = "CONFIDENCE_THRESHOLD",
        default_value_t = DEFAULT_CONFIDENCE_THRESHOLD,
        value_parser = parse_threshold,
        global = true
    )]
    pub confidence_threshold: f32,

    /// TrueType font for labels; a system font is tried when unset.
    #[arg(long, env = "FRAMESIGHT_FONT", global = true)]
    pub font: Option<PathBuf>,

    /// Box outline width in pixels.
    #[arg(long, default_value_t = 3, global = true)]
    pub stroke_width: u32,
}

impl RenderArgs {
    pub fn style(&self) -> Result<AnnotationStyle> {
        let mut style = AnnotationStyle::default().with_threshold(self.confidence_threshold);
        style.stroke_width = self.stroke_width;
        match &self.font {
            Some(path) => style.with_font_path(path),
            None => Ok(style.with_system_font()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Image to submit.
    pub file: PathBuf,
    /// Also draw the detections and write the annotated image here.
    #[arg(long)]
    pub annotate: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CameraArgs {
    #[arg(long, default_value = "/dev/video0")]
    pub device: String,
    #[arg(long, default_value = "MJPG")]
    pub fourcc: String,
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    #[arg(long, default_value_t = 480)]
    pub height: u32,
    #[arg(long, default_value_t = 30)]
    pub fps: u32,
    /// Number of frames to capture and submit.
    #[arg(long, default_value_t = 1)]
    pub frames: u32,
    /// Pause between captures.
    #[arg(long, default_value_t = 0)]
    pub interval_ms: u64,
    /// Annotated frames are written here as frame_NNNN.png.
    #[arg(long, default_value = "captures")]
    pub output_dir: PathBuf,
}

impl From<&CameraArgs> for (CameraId, CameraMode) {
    fn from(a: &CameraArgs) -> Self {
        (
            CameraId { path: a.device.clone() },
            CameraMode {
                format: a.fourcc.clone(),
                size: FrameSize { width: a.width, height: a.height },
                fps: a.fps,
            },
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:8501")]
    pub bind: String,
    /// Directory holding the dashboard page.
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,
}

fn parse_threshold(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is not in [0, 1]"))
    }
}
