use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Finds face bounding boxes in a frame, in that frame's pixel coordinates.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
