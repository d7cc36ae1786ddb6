use crate::shared::frame::Frame;

pub type DecodedFrames<'a> = Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + 'a>;

/// Decodes a chunk's self-contained clip into RGB frames in decode order.
pub trait ChunkDecoder: Send {
    fn decode<'a>(&'a mut self, media: &[u8]) -> Result<DecodedFrames<'a>, Box<dyn std::error::Error>>;
}
