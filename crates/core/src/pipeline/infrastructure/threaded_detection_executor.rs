use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, SendTimeoutError};

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_observation::DetectedFace;
use crate::pipeline::detection_executor::{DetectionExecutor, SampledFrameIter};
use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;

/// Jobs queued per worker before `send` starts waiting.
const QUEUE_DEPTH_PER_WORKER: usize = 2;

struct Job {
    batch: u64,
    frame_index: usize,
    chunk_index: usize,
    crop_padding: u32,
    frame: Frame,
}

struct JobResult {
    batch: u64,
    frame_index: usize,
    outcome: Result<Vec<DetectedFace>, String>,
}

/// Fans a chunk's sampled frames out to worker threads, one detector each.
///
/// Layout: `caller → job queue → N × [detect + crop] → result queue → caller`
///
/// The caller blocks until every frame has reported or `frame_timeout`
/// passes with no new result. Frames still outstanding at that point are
/// dropped from the chunk; their results arrive tagged with an old batch
/// number and are discarded. Workers exit when the executor is dropped.
pub struct ThreadedDetectionExecutor {
    job_tx: crossbeam_channel::Sender<Job>,
    result_rx: crossbeam_channel::Receiver<JobResult>,
    embedding_dim: usize,
    frame_timeout: Duration,
    next_batch: u64,
}

impl ThreadedDetectionExecutor {
    pub fn new(
        detectors: Vec<Box<dyn FaceDetector>>,
        frame_timeout: Duration,
    ) -> Result<Self, &'static str> {
        let embedding_dim = detectors
            .first()
            .map(|d| d.embedding_dim())
            .ok_or("at least one detector is required")?;
        if detectors.iter().any(|d| d.embedding_dim() != embedding_dim) {
            return Err("detectors disagree on embedding dimension");
        }

        let (job_tx, job_rx) =
            crossbeam_channel::bounded::<Job>(detectors.len() * QUEUE_DEPTH_PER_WORKER);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<JobResult>();
        for detector in detectors {
            spawn_worker(detector, job_rx.clone(), result_tx.clone());
        }

        Ok(Self {
            job_tx,
            result_rx,
            embedding_dim,
            frame_timeout,
            next_batch: 0,
        })
    }

    fn accept(
        &self,
        batch: u64,
        result: JobResult,
        pending: &mut BTreeSet<usize>,
        collected: &mut BTreeMap<usize, Vec<DetectedFace>>,
    ) {
        if result.batch != batch {
            log::debug!("Discarding late result for frame {}", result.frame_index);
            return;
        }
        pending.remove(&result.frame_index);
        match result.outcome {
            Ok(faces) => {
                collected.insert(result.frame_index, faces);
            }
            Err(e) => log::warn!("Frame {}: detection failed: {e}", result.frame_index),
        }
    }
}

fn spawn_worker(
    mut detector: Box<dyn FaceDetector>,
    job_rx: crossbeam_channel::Receiver<Job>,
    result_tx: crossbeam_channel::Sender<JobResult>,
) {
    std::thread::spawn(move || {
        for job in job_rx {
            let outcome = detector
                .detect(&job.frame)
                .map(|detections| {
                    DetectedFace::from_detections(
                        &job.frame,
                        job.frame_index,
                        job.chunk_index,
                        job.crop_padding,
                        detections,
                    )
                })
                .map_err(|e| e.to_string());
            let result = JobResult {
                batch: job.batch,
                frame_index: job.frame_index,
                outcome,
            };
            if result_tx.send(result).is_err() {
                break;
            }
        }
    });
}

impl DetectionExecutor for ThreadedDetectionExecutor {
    fn detect_chunk(
        &mut self,
        chunk_index: usize,
        frames: SampledFrameIter<'_>,
        crop_padding: u32,
    ) -> Result<Vec<DetectedFace>, AnalysisError> {
        let batch = self.next_batch;
        self.next_batch += 1;

        let mut pending = BTreeSet::new();
        let mut collected = BTreeMap::new();
        let workers_gone = || AnalysisError::capability("detect", "detection workers exited");

        for (frame_index, frame) in frames {
            let job = Job {
                batch,
                frame_index,
                chunk_index,
                crop_padding,
                frame,
            };
            match self.job_tx.send_timeout(job, self.frame_timeout) {
                Ok(()) => {
                    pending.insert(frame_index);
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    log::warn!("Chunk {chunk_index} frame {frame_index}: workers busy, skipping");
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(workers_gone()),
            }
            while let Ok(result) = self.result_rx.try_recv() {
                self.accept(batch, result, &mut pending, &mut collected);
            }
        }

        while !pending.is_empty() {
            match self.result_rx.recv_timeout(self.frame_timeout) {
                Ok(result) => self.accept(batch, result, &mut pending, &mut collected),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Chunk {chunk_index}: {} frame(s) timed out after {:?}",
                        pending.len(),
                        self.frame_timeout
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => return Err(workers_gone()),
            }
        }

        Ok(collected.into_values().flatten().collect())
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detector::FaceDetection;
    use crate::pipeline::infrastructure::sequential_detection_executor::tests::{
        frame, PixelDetector, SlowDetector,
    };

    fn pixel_workers(n: usize) -> Vec<Box<dyn FaceDetector>> {
        (0..n)
            .map(|_| Box::new(PixelDetector) as Box<dyn FaceDetector>)
            .collect()
    }

    #[test]
    fn test_results_ordered_by_frame_index() {
        let mut executor =
            ThreadedDetectionExecutor::new(pixel_workers(3), Duration::from_secs(5)).unwrap();
        let mut frames = (0..12).map(|i| (i * 2, frame(i as u8 + 1)));

        let faces = executor.detect_chunk(0, &mut frames, 0).unwrap();
        let indices: Vec<usize> = faces.iter().map(|f| f.observation.frame_index).collect();
        assert_eq!(indices, (0..12).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_failed_frame_contributes_nothing() {
        let mut executor =
            ThreadedDetectionExecutor::new(pixel_workers(2), Duration::from_secs(5)).unwrap();
        let mut frames = vec![(0, frame(5)), (1, frame(255)), (2, frame(6))].into_iter();

        let faces = executor.detect_chunk(1, &mut frames, 0).unwrap();
        let indices: Vec<usize> = faces.iter().map(|f| f.observation.frame_index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_timed_out_frame_is_dropped_and_late_result_discarded() {
        let detectors: Vec<Box<dyn FaceDetector>> = vec![
            Box::new(SlowDetector {
                delay: Duration::from_millis(600),
            }),
            Box::new(SlowDetector {
                delay: Duration::from_millis(600),
            }),
        ];
        let mut executor =
            ThreadedDetectionExecutor::new(detectors, Duration::from_millis(150)).unwrap();

        let mut first = vec![(0, frame(200)), (1, frame(7))].into_iter();
        let faces = executor.detect_chunk(0, &mut first, 0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].observation.frame_index, 1);

        std::thread::sleep(Duration::from_millis(700));
        let mut second = vec![(0, frame(9))].into_iter();
        let faces = executor.detect_chunk(1, &mut second, 0).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].observation.chunk_index, 1);
        assert_eq!(faces[0].observation.embedding.values(), &[9.0, 0.0]);
    }

    #[test]
    fn test_empty_chunk_returns_immediately() {
        let mut executor =
            ThreadedDetectionExecutor::new(pixel_workers(1), Duration::from_secs(5)).unwrap();
        let mut frames = std::iter::empty::<(usize, Frame)>();
        assert!(executor.detect_chunk(0, &mut frames, 0).unwrap().is_empty());
    }

    #[test]
    fn test_new_rejects_empty_worker_list() {
        assert!(ThreadedDetectionExecutor::new(Vec::new(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_new_rejects_mismatched_dimensions() {
        struct Wide;
        impl FaceDetector for Wide {
            fn detect(&mut self, _: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
                Ok(Vec::new())
            }
            fn embedding_dim(&self) -> usize {
                512
            }
        }
        let detectors: Vec<Box<dyn FaceDetector>> = vec![Box::new(PixelDetector), Box::new(Wide)];
        assert!(ThreadedDetectionExecutor::new(detectors, Duration::from_secs(1)).is_err());
    }
}
