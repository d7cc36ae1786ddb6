use crate::detection::domain::face_observation::DetectedFace;
use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;

/// Sampled frames of one chunk as `(frame_index, frame)` pairs.
pub type SampledFrameIter<'a> = &'a mut dyn Iterator<Item = (usize, Frame)>;

/// Runs face detection over the sampled frames of one chunk.
///
/// Returns once every frame has reported or been given up on, which is the
/// per-chunk barrier clustering waits for. Faces come back ordered by frame
/// index, then by detector order within a frame. A frame whose detection
/// fails or times out contributes no faces.
pub trait DetectionExecutor: Send {
    fn detect_chunk(
        &mut self,
        chunk_index: usize,
        frames: SampledFrameIter<'_>,
        crop_padding: u32,
    ) -> Result<Vec<DetectedFace>, AnalysisError>;

    /// Embedding length of the underlying detector.
    fn embedding_dim(&self) -> usize;
}
