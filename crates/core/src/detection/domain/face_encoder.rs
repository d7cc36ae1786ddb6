use crate::shared::embedding::Embedding;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Computes one embedding per box. Returned vectors follow the order of
/// `boxes` and all have length [`FaceEncoder::dimension`].
pub trait FaceEncoder: Send {
    fn dimension(&self) -> usize;

    fn encode(
        &mut self,
        frame: &Frame,
        boxes: &[FaceBox],
    ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>>;
}
