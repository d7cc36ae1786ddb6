use crate::shared::frame::Frame;

/// Encodes a face crop into a compact image format for results.
pub trait CropEncoder: Send {
    /// MIME type of the bytes returned by [`CropEncoder::encode`].
    fn mime_type(&self) -> &'static str;

    fn encode(&self, crop: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}

/// Decodes a still image (e.g. a reference photo) into an RGB frame.
pub trait ImageDecoder: Send {
    fn decode(&self, bytes: &[u8]) -> Result<Frame, Box<dyn std::error::Error>>;
}
