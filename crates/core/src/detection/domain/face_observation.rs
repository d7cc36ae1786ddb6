use crate::detection::domain::face_detector::FaceDetection;
use crate::shared::embedding::Embedding;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// A face detected on a sampled frame of one chunk.
///
/// Lives only while its chunk is processed.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    pub embedding: Embedding,
    pub bbox: FaceBox,
    pub quality: f64,
    pub frame_index: usize,
    pub chunk_index: usize,
}

/// An observation paired with the padded face crop cut from its frame.
///
/// Cutting the crop at detection time lets the frame be dropped before the
/// rest of the chunk is decoded.
#[derive(Clone, Debug)]
pub struct DetectedFace {
    pub observation: FaceObservation,
    pub crop: Frame,
}

impl DetectedFace {
    pub fn from_detections(
        frame: &Frame,
        frame_index: usize,
        chunk_index: usize,
        crop_padding: u32,
        detections: Vec<FaceDetection>,
    ) -> Vec<DetectedFace> {
        detections
            .into_iter()
            .map(|d| {
                let padded = d.bbox.padded(crop_padding, frame.width(), frame.height());
                DetectedFace {
                    crop: frame.crop(&padded),
                    observation: FaceObservation {
                        embedding: d.embedding,
                        bbox: d.bbox,
                        quality: d.quality,
                        frame_index,
                        chunk_index,
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_detections_pads_and_clamps_crop() {
        let frame = Frame::new(vec![7; 100 * 80 * 3], 100, 80, 3, 4);
        let detection = FaceDetection {
            bbox: FaceBox::new(10, 50, 40, 20),
            embedding: Embedding::new(vec![1.0, 0.0]),
            quality: 0.8,
        };

        let faces = DetectedFace::from_detections(&frame, 12, 3, 15, vec![detection]);
        assert_eq!(faces.len(), 1);
        let face = &faces[0];
        assert_eq!(face.observation.frame_index, 12);
        assert_eq!(face.observation.chunk_index, 3);
        assert_eq!(face.observation.bbox, FaceBox::new(10, 50, 40, 20));
        // top clamps to 0, left to 5: 60 wide (5..65), 55 tall (0..55)
        assert_eq!(face.crop.width(), 60);
        assert_eq!(face.crop.height(), 55);
    }

    #[test]
    fn test_from_detections_empty() {
        let frame = Frame::new(vec![0; 12], 2, 2, 3, 0);
        assert!(DetectedFace::from_detections(&frame, 0, 0, 30, Vec::new()).is_empty());
    }
}
