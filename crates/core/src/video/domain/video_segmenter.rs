use crate::shared::error::AnalysisError;
use crate::video::domain::chunk::{plan_chunks, Chunk};
use crate::video::domain::video_transcoder::VideoTranscoder;

/// Splits a source video into independently decodable chunks.
///
/// All-or-nothing: if the duration is unknown or any clip fails to
/// transcode, no chunks are returned, since later stages rely on a
/// complete, contiguous index range.
pub struct VideoSegmenter {
    transcoder: Box<dyn VideoTranscoder>,
    chunk_duration: f64,
}

impl VideoSegmenter {
    pub fn new(transcoder: Box<dyn VideoTranscoder>, chunk_duration: f64) -> Result<Self, &'static str> {
        if !(chunk_duration > 0.0) {
            return Err("chunk_duration must be > 0");
        }
        Ok(Self {
            transcoder,
            chunk_duration,
        })
    }

    pub fn segment(&mut self, video: &[u8]) -> Result<Vec<Chunk>, AnalysisError> {
        if video.is_empty() {
            return Err(AnalysisError::Input("video is empty".into()));
        }
        let total = self
            .transcoder
            .media_duration(video)
            .map_err(|e| AnalysisError::Input(format!("cannot determine video duration: {e}")))?;
        if !total.is_finite() || total <= 0.0 {
            return Err(AnalysisError::Input(format!(
                "video has no usable duration ({total})"
            )));
        }

        let spans = plan_chunks(total, self.chunk_duration);
        log::info!(
            "Segmenting {total:.2}s video into {} chunk(s) of {}s",
            spans.len(),
            self.chunk_duration
        );

        let clips = self
            .transcoder
            .extract_clips(video, &spans)
            .map_err(|e| AnalysisError::capability("transcode", e))?;
        if clips.len() != spans.len() {
            return Err(AnalysisError::capability(
                "transcode",
                format!("expected {} clips, got {}", spans.len(), clips.len()),
            ));
        }

        Ok(spans
            .into_iter()
            .zip(clips)
            .map(|(span, media_bytes)| Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                index: span.index,
                start_time: span.start_time,
                end_time: span.end_time,
                media_bytes,
            })
            .collect())
    }
}
