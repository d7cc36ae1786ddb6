use std::io::Write;

use tempfile::NamedTempFile;

use crate::shared::constants::DURATION_EPSILON;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::chunk::ChunkSpan;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_transcoder::VideoTranscoder;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Writes in-memory media to a temp file so libavformat can open and seek it.
pub(crate) fn spool(media: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("facegraph-")
        .suffix(".media")
        .tempfile()?;
    file.write_all(media)?;
    file.flush()?;
    Ok(file)
}

/// Reads durations and re-encodes sub-clips with ffmpeg-next.
///
/// A clip keeps every source frame whose presentation time `index / fps`
/// falls in `[start, start + duration)`. [`VideoTranscoder::extract_clips`]
/// spools and decodes the source once, handing each frame to the clip whose
/// span contains it.
#[derive(Default)]
pub struct FfmpegTranscoder {
    decoded_frames: usize,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source frames decoded so far across all calls.
    pub fn decoded_frames(&self) -> usize {
        self.decoded_frames
    }
}

/// One clip being encoded into its own temp file.
struct ClipEncoder {
    file: NamedTempFile,
    writer: FfmpegWriter,
    written: usize,
}

impl ClipEncoder {
    fn open(source: &VideoMetadata, duration: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let file = tempfile::Builder::new()
            .prefix("facegraph-clip-")
            .suffix(".mp4")
            .tempfile()?;
        let metadata = VideoMetadata {
            total_frames: 0,
            duration_secs: duration,
            source_path: None,
            ..source.clone()
        };
        let mut writer = FfmpegWriter::new();
        writer.open(file.path(), &metadata)?;
        Ok(Self {
            file,
            writer,
            written: 0,
        })
    }

    fn push(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.write(frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        self.writer.close()?;
        Ok(std::fs::read(self.file.path())?)
    }
}

impl VideoTranscoder for FfmpegTranscoder {
    fn media_duration(&mut self, media: &[u8]) -> Result<f64, Box<dyn std::error::Error>> {
        let source = spool(media)?;
        let mut reader = FfmpegReader::new();
        let metadata = reader.open(source.path())?;
        reader.close();
        Ok(metadata.effective_duration())
    }

    fn extract_clip(
        &mut self,
        media: &[u8],
        start: f64,
        duration: f64,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let span = ChunkSpan {
            index: 0,
            start_time: start,
            end_time: start + duration,
        };
        self.extract_clips(media, &[span])?
            .pop()
            .ok_or_else(|| "no clip produced".into())
    }

    fn extract_clips(
        &mut self,
        media: &[u8],
        spans: &[ChunkSpan],
    ) -> Result<Vec<Vec<u8>>, Box<dyn std::error::Error>> {
        if spans.is_empty() {
            return Ok(Vec::new());
        }
        let source = spool(media)?;
        let mut reader = FfmpegReader::new();
        let metadata = reader.open(source.path())?;
        if metadata.fps <= 0.0 {
            return Err("source has no usable frame rate".into());
        }
        let time_of = |position: usize| position as f64 / metadata.fps + DURATION_EPSILON;

        let mut clips = Vec::with_capacity(spans.len());
        let mut frames = reader.frames().enumerate().peekable();
        for span in spans {
            let mut clip = ClipEncoder::open(&metadata, span.duration())
                .map_err(|e| format!("chunk {}: {e}", span.index))?;
            while let Some(&(position, _)) = frames.peek() {
                if time_of(position) >= span.end_time {
                    break;
                }
                let Some((position, frame)) = frames.next() else {
                    break;
                };
                self.decoded_frames += 1;
                if time_of(position) < span.start_time {
                    continue;
                }
                match frame {
                    Ok(frame) => clip
                        .push(&frame)
                        .map_err(|e| format!("chunk {}: {e}", span.index))?,
                    Err(e) => log::warn!("Dropping undecodable frame {position} from clip: {e}"),
                }
            }
            let written = clip.written;
            clips.push(clip.finish().map_err(|e| format!("chunk {}: {e}", span.index))?);
            log::debug!(
                "Encoded chunk {} [{:.2}s, {:.2}s) with {written} frame(s)",
                span.index,
                span.start_time,
                span.end_time
            );
        }
        drop(frames);
        reader.close();
        Ok(clips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::test_video::test_video_bytes;

    fn frame_count(media: &[u8]) -> usize {
        let file = spool(media).unwrap();
        let mut reader = FfmpegReader::new();
        reader.open(file.path()).unwrap();
        let count = reader.frames().filter(|f| f.is_ok()).count();
        count
    }

    #[test]
    fn test_media_duration_of_clip() {
        let video = test_video_bytes(30, 10.0);
        let duration = FfmpegTranscoder::new().media_duration(&video).unwrap();
        assert!((duration - 3.0).abs() < 0.2, "duration was {duration}");
    }

    #[test]
    fn test_duration_of_garbage_fails() {
        assert!(FfmpegTranscoder::new()
            .media_duration(b"definitely not a video")
            .is_err());
    }

    #[test]
    fn test_extract_clip_keeps_only_range() {
        let video = test_video_bytes(30, 10.0);
        let clip = FfmpegTranscoder::new()
            .extract_clip(&video, 1.0, 1.0)
            .unwrap();
        assert_eq!(frame_count(&clip), 10);
    }

    fn span(index: usize, start_time: f64, end_time: f64) -> ChunkSpan {
        ChunkSpan {
            index,
            start_time,
            end_time,
        }
    }

    #[test]
    fn test_clips_partition_source_frames() {
        let video = test_video_bytes(25, 10.0);
        let mut transcoder = FfmpegTranscoder::new();
        let spans = [span(0, 0.0, 1.0), span(1, 1.0, 2.0), span(2, 2.0, 2.5)];
        let counts: Vec<usize> = transcoder
            .extract_clips(&video, &spans)
            .unwrap()
            .iter()
            .map(|clip| frame_count(clip))
            .collect();
        assert_eq!(counts, vec![10, 10, 5]);
    }

    #[test]
    fn test_each_source_frame_decoded_once_per_segmentation() {
        let video = test_video_bytes(25, 10.0);
        let mut transcoder = FfmpegTranscoder::new();
        let spans = [span(0, 0.0, 1.0), span(1, 1.0, 2.0), span(2, 2.0, 2.5)];
        transcoder.extract_clips(&video, &spans).unwrap();
        assert_eq!(transcoder.decoded_frames(), 25);
    }
}
