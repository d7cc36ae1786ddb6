use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub duration_secs: f64,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Best-effort duration: the container value when known, otherwise
    /// derived from the frame count and rate.
    pub fn effective_duration(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.duration_secs
        } else if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}
