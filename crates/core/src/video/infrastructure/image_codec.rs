use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::shared::frame::Frame;
use crate::video::domain::image_codec::{CropEncoder, ImageDecoder};

const DEFAULT_JPEG_QUALITY: u8 = 95;

/// JPEG crop encoding and still-image decoding with the `image` crate.
pub struct ImageCrateCodec {
    jpeg_quality: u8,
}

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

impl Default for ImageCrateCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl CropEncoder for ImageCrateCodec {
    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    fn encode(&self, crop: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if crop.is_empty() {
            return Err("cannot encode an empty crop".into());
        }
        if crop.channels() != 3 {
            return Err(format!("expected RGB crop, got {} channels", crop.channels()).into());
        }
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality).encode(
            crop.data(),
            crop.width(),
            crop.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(buf)
    }
}

impl ImageDecoder for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(img.into_raw(), width, height, 3, 0))
    }
}
