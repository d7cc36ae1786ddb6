use std::fs;
use std::path::PathBuf;

use crate::pipeline::analysis_store::AnalysisStore;
use crate::pipeline::video_analysis::VideoAnalysis;
use crate::shared::file_store::{safe_component, write_atomic};

const ANALYSES_DIR: &str = "analyses";

/// File-backed analysis store: `<root>/<owner>/analyses/<video_id>.json`.
///
/// Shares its root with [`JsonIdentityStore`] so an owner's identities and
/// results live side by side.
///
/// [`JsonIdentityStore`]: crate::identity::infrastructure::json_identity_store::JsonIdentityStore
pub struct JsonAnalysisStore {
    root: PathBuf,
}

impl JsonAnalysisStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn analysis_path(&self, owner: &str, video_id: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let file = format!("{}.json", safe_component(video_id, "video id")?);
        Ok(self
            .root
            .join(safe_component(owner, "owner")?)
            .join(ANALYSES_DIR)
            .join(file))
    }
}

impl AnalysisStore for JsonAnalysisStore {
    fn save_analysis(&mut self, analysis: &VideoAnalysis) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.analysis_path(&analysis.owner, &analysis.video_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(analysis)?;
        write_atomic(&path, json.as_bytes())?;
        log::debug!("Saved analysis to {}", path.display());
        Ok(())
    }

    fn load_analysis(
        &self,
        owner: &str,
        video_id: &str,
    ) -> Result<Option<VideoAnalysis>, Box<dyn std::error::Error>> {
        let path = self.analysis_path(owner, video_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| format!("corrupt analysis file {}: {e}", path.display()).into())
    }
}
