use crate::pipeline::video_analysis::VideoAnalysis;

/// Persists finished analyses so they can be read back per video.
pub trait AnalysisStore: Send {
    /// Stores `analysis` under its owner and video id, replacing any
    /// earlier result for the same video.
    fn save_analysis(&mut self, analysis: &VideoAnalysis) -> Result<(), Box<dyn std::error::Error>>;

    fn load_analysis(
        &self,
        owner: &str,
        video_id: &str,
    ) -> Result<Option<VideoAnalysis>, Box<dyn std::error::Error>>;
}
