//! Synthetic clips for ffmpeg-backed tests.

use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

pub const TEST_WIDTH: u32 = 160;
pub const TEST_HEIGHT: u32 = 120;

/// Writes `num_frames` solid frames whose gray level steps per frame.
pub fn write_test_video(dir: &Path, name: &str, num_frames: usize, fps: f64) -> PathBuf {
    let path = dir.join(name);
    let metadata = VideoMetadata {
        width: TEST_WIDTH,
        height: TEST_HEIGHT,
        fps,
        total_frames: 0,
        duration_secs: 0.0,
        codec: String::new(),
        source_path: None,
    };
    let mut writer = FfmpegWriter::new();
    writer.open(&path, &metadata).unwrap();
    for i in 0..num_frames {
        let value = ((i * 40) % 256) as u8;
        let data = vec![value; (TEST_WIDTH * TEST_HEIGHT * 3) as usize];
        writer
            .write(&Frame::new(data, TEST_WIDTH, TEST_HEIGHT, 3, i))
            .unwrap();
    }
    writer.close().unwrap();
    path
}

pub fn test_video_bytes(num_frames: usize, fps: f64) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_test_video(dir.path(), "clip.mp4", num_frames, fps);
    std::fs::read(path).unwrap()
}
