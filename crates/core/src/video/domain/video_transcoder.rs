use crate::video::domain::chunk::ChunkSpan;

/// Video decode/transcode capability working on in-memory media.
pub trait VideoTranscoder: Send {
    /// Total duration in seconds. Zero or negative means unknown.
    fn media_duration(&mut self, media: &[u8]) -> Result<f64, Box<dyn std::error::Error>>;

    /// Re-encodes `[start, start + duration)` as a standalone clip.
    fn extract_clip(
        &mut self,
        media: &[u8],
        start: f64,
        duration: f64,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// Re-encodes every span, in order, one clip per span.
    ///
    /// Spans are ascending and contiguous. Implementations that decode the
    /// source sequentially should override this to make a single pass.
    fn extract_clips(
        &mut self,
        media: &[u8],
        spans: &[ChunkSpan],
    ) -> Result<Vec<Vec<u8>>, Box<dyn std::error::Error>> {
        spans
            .iter()
            .map(|span| {
                self.extract_clip(media, span.start_time, span.duration())
                    .map_err(|e| -> Box<dyn std::error::Error> {
                        format!("chunk {}: {e}", span.index).into()
                    })
            })
            .collect()
    }
}
