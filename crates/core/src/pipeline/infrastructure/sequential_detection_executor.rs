use std::time::{Duration, Instant};

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_observation::DetectedFace;
use crate::pipeline::detection_executor::{DetectionExecutor, SampledFrameIter};
use crate::shared::error::AnalysisError;

/// Detects on the calling thread, one frame at a time.
///
/// A detector call cannot be interrupted on this thread, so a frame that
/// overruns `frame_timeout` is treated as failed once it returns: its faces
/// are discarded, as for a frame whose detection errored.
pub struct SequentialDetectionExecutor {
    detector: Box<dyn FaceDetector>,
    frame_timeout: Duration,
}

impl SequentialDetectionExecutor {
    pub fn new(detector: Box<dyn FaceDetector>, frame_timeout: Duration) -> Self {
        Self {
            detector,
            frame_timeout,
        }
    }
}

impl DetectionExecutor for SequentialDetectionExecutor {
    fn detect_chunk(
        &mut self,
        chunk_index: usize,
        frames: SampledFrameIter<'_>,
        crop_padding: u32,
    ) -> Result<Vec<DetectedFace>, AnalysisError> {
        let mut faces = Vec::new();
        for (frame_index, frame) in frames {
            let started = Instant::now();
            let detections = match self.detector.detect(&frame) {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Chunk {chunk_index} frame {frame_index}: detection failed: {e}");
                    continue;
                }
            };
            let elapsed = started.elapsed();
            if elapsed > self.frame_timeout {
                log::warn!(
                    "Chunk {chunk_index} frame {frame_index}: detection took {elapsed:?}, \
                     over the {:?} limit, skipping",
                    self.frame_timeout
                );
                continue;
            }
            faces.extend(DetectedFace::from_detections(
                &frame,
                frame_index,
                chunk_index,
                crop_padding,
                detections,
            ));
        }
        Ok(faces)
    }

    fn embedding_dim(&self) -> usize {
        self.detector.embedding_dim()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetection;
    use crate::shared::embedding::Embedding;
    use crate::shared::face_box::FaceBox;
    use crate::shared::frame::Frame;

    /// Finds one face per frame whose first pixel is non-zero, embedding
    /// `[pixel, 0]`. Frames whose first pixel is 255 fail.
    pub(crate) struct PixelDetector;

    impl FaceDetector for PixelDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            match frame.data()[0] {
                0 => Ok(Vec::new()),
                255 => Err("detector crashed".into()),
                v => Ok(vec![FaceDetection {
                    bbox: FaceBox::new(0, 4, 4, 0),
                    embedding: Embedding::new(vec![v as f32, 0.0]),
                    quality: 0.9,
                }]),
            }
        }

        fn embedding_dim(&self) -> usize {
            2
        }
    }

    /// Sleeps on frames whose first pixel is 200, otherwise one face.
    pub(crate) struct SlowDetector {
        pub(crate) delay: Duration,
    }

    impl FaceDetector for SlowDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            if frame.data()[0] == 200 {
                std::thread::sleep(self.delay);
            }
            Ok(vec![FaceDetection {
                bbox: FaceBox::new(0, 4, 4, 0),
                embedding: Embedding::new(vec![frame.data()[0] as f32, 0.0]),
                quality: 0.9,
            }])
        }

        fn embedding_dim(&self) -> usize {
            2
        }
    }

    pub(crate) fn frame(value: u8) -> Frame {
        Frame::new(vec![value; 8 * 8 * 3], 8, 8, 3, 0)
    }

    #[test]
    fn test_collects_faces_in_frame_order() {
        let mut executor =
            SequentialDetectionExecutor::new(Box::new(PixelDetector), Duration::from_secs(5));
        let mut frames = vec![(0, frame(10)), (3, frame(0)), (6, frame(20))].into_iter();

        let faces = executor.detect_chunk(2, &mut frames, 1).unwrap();
        let indices: Vec<usize> = faces.iter().map(|f| f.observation.frame_index).collect();
        assert_eq!(indices, vec![0, 6]);
        assert!(faces.iter().all(|f| f.observation.chunk_index == 2));
        assert_eq!(faces[1].observation.embedding.values(), &[20.0, 0.0]);
    }

    #[test]
    fn test_failing_frame_is_skipped() {
        let mut executor =
            SequentialDetectionExecutor::new(Box::new(PixelDetector), Duration::from_secs(5));
        let mut frames = vec![(0, frame(255)), (1, frame(30))].into_iter();

        let faces = executor.detect_chunk(0, &mut frames, 0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].observation.frame_index, 1);
    }

    #[test]
    fn test_frame_over_timeout_is_dropped() {
        let detector = SlowDetector {
            delay: Duration::from_millis(300),
        };
        let mut executor =
            SequentialDetectionExecutor::new(Box::new(detector), Duration::from_millis(50));
        let mut frames = vec![(0, frame(200)), (1, frame(7))].into_iter();

        let faces = executor.detect_chunk(0, &mut frames, 0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].observation.frame_index, 1);
    }

    #[test]
    fn test_only_slow_frame_yields_nothing() {
        let detector = SlowDetector {
            delay: Duration::from_millis(300),
        };
        let mut executor =
            SequentialDetectionExecutor::new(Box::new(detector), Duration::from_millis(50));
        let mut frames = vec![(0, frame(200))].into_iter();
        assert!(executor.detect_chunk(0, &mut frames, 0).unwrap().is_empty());
    }

    #[test]
    fn test_reports_detector_dimension() {
        let executor =
            SequentialDetectionExecutor::new(Box::new(PixelDetector), Duration::from_secs(5));
        assert_eq!(executor.embedding_dim(), 2);
    }
}
