use crate::detection::domain::face_detector::{FaceDetection, FaceDetector};
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::face_quality::face_quality;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Locates faces on a downscaled copy of the frame, then re-projects the
/// boxes to full resolution and embeds them there.
///
/// Boxes narrower or shorter than `min_face_size` after re-projection are
/// discarded before embedding.
pub struct ScaledFaceDetector {
    locator: Box<dyn FaceLocator>,
    encoder: Box<dyn FaceEncoder>,
    detection_scale: f64,
    min_face_size: u32,
    reference_area: f64,
}

impl ScaledFaceDetector {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        encoder: Box<dyn FaceEncoder>,
        detection_scale: f64,
        min_face_size: u32,
        reference_area: f64,
    ) -> Result<Self, &'static str> {
        if !(detection_scale > 0.0 && detection_scale <= 1.0) {
            return Err("detection_scale must be in (0, 1]");
        }
        if !(reference_area > 0.0) {
            return Err("reference_area must be > 0");
        }
        Ok(Self {
            locator,
            encoder,
            detection_scale,
            min_face_size,
            reference_area,
        })
    }

    fn full_resolution_boxes(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let boxes = if self.detection_scale < 1.0 {
            let small = frame.downscale(self.detection_scale);
            let factor = 1.0 / self.detection_scale;
            self.locator
                .locate(&small)?
                .into_iter()
                .map(|b| b.scaled(factor))
                .collect::<Vec<_>>()
        } else {
            self.locator.locate(frame)?
        };

        let min = self.min_face_size as i32;
        Ok(boxes
            .into_iter()
            .map(|b| b.clamped(frame.width(), frame.height()))
            .filter(|b| b.width() >= min && b.height() >= min)
            .collect())
    }
}

impl FaceDetector for ScaledFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let boxes = self.full_resolution_boxes(frame)?;
        if boxes.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.encoder.encode(frame, &boxes)?;
        if embeddings.len() != boxes.len() {
            return Err(format!(
                "encoder returned {} embeddings for {} faces",
                embeddings.len(),
                boxes.len()
            )
            .into());
        }

        Ok(boxes
            .into_iter()
            .zip(embeddings)
            .map(|(bbox, embedding)| FaceDetection {
                quality: face_quality(&bbox, self.reference_area),
                bbox,
                embedding,
            })
            .collect())
    }

    fn embedding_dim(&self) -> usize {
        self.encoder.dimension()
    }
}
