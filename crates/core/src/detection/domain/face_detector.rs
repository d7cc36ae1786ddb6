use crate::shared::embedding::Embedding;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// One face found in a frame, with its full-resolution box and embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetection {
    pub bbox: FaceBox,
    pub embedding: Embedding,
    pub quality: f64,
}

/// Domain interface for face detection plus embedding.
///
/// Implementations may hold inference sessions with mutable scratch state,
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;

    /// Length of every embedding this detector produces.
    fn embedding_dim(&self) -> usize;
}
