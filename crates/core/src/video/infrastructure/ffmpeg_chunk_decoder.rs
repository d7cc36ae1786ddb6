use tempfile::NamedTempFile;

use crate::video::domain::chunk_decoder::{ChunkDecoder, DecodedFrames};
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_transcoder::spool;

/// Decodes chunk clips with [`FfmpegReader`].
///
/// The clip is spooled to a temp file that lives until the next call, since
/// the returned frame iterator reads from it lazily.
#[derive(Default)]
pub struct FfmpegChunkDecoder {
    reader: FfmpegReader,
    spool: Option<NamedTempFile>,
}

impl FfmpegChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkDecoder for FfmpegChunkDecoder {
    fn decode<'a>(&'a mut self, media: &[u8]) -> Result<DecodedFrames<'a>, Box<dyn std::error::Error>> {
        self.reader.close();
        self.spool = None;

        let file = spool(media)?;
        self.reader.open(file.path())?;
        self.spool = Some(file);
        Ok(self.reader.frames())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::test_video::{test_video_bytes, TEST_HEIGHT, TEST_WIDTH};

    #[test]
    fn test_decodes_all_frames() {
        let clip = test_video_bytes(6, 10.0);
        let mut decoder = FfmpegChunkDecoder::new();
        let frames: Vec<_> = decoder.decode(&clip).unwrap().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[0].width(), TEST_WIDTH);
        assert_eq!(frames[0].height(), TEST_HEIGHT);
    }

    #[test]
    fn test_decoder_is_reusable_across_chunks() {
        let mut decoder = FfmpegChunkDecoder::new();
        let first = decoder.decode(&test_video_bytes(3, 10.0)).unwrap().count();
        let second = decoder.decode(&test_video_bytes(5, 10.0)).unwrap().count();
        assert_eq!((first, second), (3, 5));
    }

    #[test]
    fn test_garbage_fails_to_open() {
        let mut decoder = FfmpegChunkDecoder::new();
        assert!(decoder.decode(b"not a clip").is_err());
    }
}
