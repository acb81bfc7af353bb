use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbImage};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::application::ports::FrameSourcePort;
use crate::domain::camera::{CameraId, CameraMode, CapturedFrame};

/// JPEG quality used when a raw YUYV frame has to be compressed for upload.
const UPLOAD_JPEG_QUALITY: u8 = 85;

/// Frame source backed by a V4L2 device in MMAP streaming mode.
pub struct V4l2Capture {
    stream: Stream<'static>,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl V4l2Capture {
    /// Opens the device and negotiates the format; the driver may pick the
    /// nearest supported size.
    pub fn open(camera: &CameraId, mode: &CameraMode) -> Result<Self> {
        let dev = Device::with_path(&camera.path)?;

        let mut fmt = dev.format()?;
        let b = mode.format.as_bytes();
        if b.len() != 4 {
            return Err(anyhow!("FourCC must be 4 characters, got {:?}", mode.format));
        }
        fmt.fourcc = FourCC::new(&[b[0], b[1], b[2], b[3]]);
        fmt.width = mode.size.width;
        fmt.height = mode.size.height;
        let actual_fmt = dev.set_format(&fmt)?;

        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = mode.fps;
        let _ = dev.set_params(&params);

        // The stream borrows the device for its whole life.
        let dev_static: &'static Device = Box::leak(Box::new(dev));
        let stream = Stream::with_buffers(dev_static, v4l::buffer::Type::VideoCapture, 4)?;

        tracing::info!(
            "Camera {} opened: {}x{} [{}] at {} FPS",
            camera.path,
            actual_fmt.width,
            actual_fmt.height,
            actual_fmt.fourcc,
            mode.fps
        );

        Ok(Self {
            stream,
            fourcc: actual_fmt.fourcc,
            width: actual_fmt.width,
            height: actual_fmt.height,
        })
    }
}

impl FrameSourcePort for V4l2Capture {
    fn next_frame(&mut self) -> Result<CapturedFrame> {
        let (data, _) = self.stream.next()?;
        let fcc_str = self.fourcc.str().map_err(|_| anyhow!("invalid FourCC"))?;

        match fcc_str {
            "MJPG" => {
                let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
                Ok(CapturedFrame { rgb: img.to_rgb8(), jpeg: data.to_vec() })
            }
            "YUYV" => {
                let rgb = yuyv_to_rgb(data, self.width, self.height);
                let mut jpeg = Vec::new();
                let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, UPLOAD_JPEG_QUALITY);
                enc.encode(rgb.as_raw(), self.width, self.height, image::ExtendedColorType::Rgb8)?;
                Ok(CapturedFrame { rgb, jpeg })
            }
            _ => Err(anyhow!("camera format {} is not supported (use MJPG or YUYV)", fcc_str)),
        }
    }
}

/// YUYV (YUV 4:2:2) to RGB, BT.601.
fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);

    // Every 4 bytes [Y0, U, Y1, V] hold two pixels sharing U and V.
    for (i, chunk) in yuyv.chunks_exact(4).enumerate() {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        let to_rgb = |y: f32| {
            image::Rgb([
                (y + 1.402 * v).clamp(0.0, 255.0) as u8,
                (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8,
                (y + 1.772 * u).clamp(0.0, 255.0) as u8,
            ])
        };

        let pixel_idx = i as u32 * 2;
        let x = pixel_idx % w;
        let y = pixel_idx / w;

        if y < h {
            out.put_pixel(x, y, to_rgb(y0));
            if x + 1 < w {
                out.put_pixel(x + 1, y, to_rgb(y1));
            }
        }
    }
    out
}
