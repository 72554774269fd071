//! Video frame type shared by detectors and the overlay renderer

use image::RgbImage;

use crate::CaptureError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Presentation timestamp relative to the start of the stream (nanoseconds)
    pub timestamp_ns: u64,
    /// Position in the stream, restarting at 0 after a rewind
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        timestamp_ns: u64,
        sequence: u64,
    ) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        })
    }

    /// Solid-colour frame, mostly useful in tests
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u64) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            timestamp_ns: 0,
            sequence,
        }
    }

    /// Wrap a decoded image
    pub fn from_rgb_image(image: RgbImage, timestamp_ns: u64, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Copy the pixels into an `image` buffer for drawing or preprocessing
    pub fn to_rgb_image(&self) -> Result<RgbImage, CaptureError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CaptureError::InvalidFrame(format!(
                "{} bytes do not fit {}x{} RGB",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }
}
