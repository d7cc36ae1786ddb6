use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_CHUNK_DURATION_SECS, DEFAULT_CROP_PADDING, DEFAULT_DETECTION_SCALE,
    DEFAULT_FACE_GROUPING_THRESHOLD, DEFAULT_FACE_MATCH_THRESHOLD, DEFAULT_FRAME_SKIP,
    DEFAULT_FRAME_TIMEOUT_MS, DEFAULT_MAX_SAMPLE_FACES, DEFAULT_MIN_FACE_SIZE,
    DEFAULT_NEW_IDENTITY_THRESHOLD, DEFAULT_REFERENCE_FACE_AREA,
};
use crate::shared::error::AnalysisError;

/// Tunables for one video analysis run.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides. Thresholds are on the cosine scale of the embedding model;
/// both are exposed because deployments tune them differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub chunk_duration_secs: f64,
    pub frame_skip: usize,
    pub detection_scale: f64,
    pub min_face_size: u32,
    pub reference_face_area: f64,
    pub face_grouping_threshold: f64,
    pub face_match_threshold: f64,
    pub new_identity_threshold: f64,
    pub max_sample_faces: usize,
    pub crop_padding: u32,
    pub frame_timeout_ms: u64,
    pub detection_workers: usize,
    pub detector_confidence: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: DEFAULT_CHUNK_DURATION_SECS,
            frame_skip: DEFAULT_FRAME_SKIP,
            detection_scale: DEFAULT_DETECTION_SCALE,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            reference_face_area: DEFAULT_REFERENCE_FACE_AREA,
            face_grouping_threshold: DEFAULT_FACE_GROUPING_THRESHOLD,
            face_match_threshold: DEFAULT_FACE_MATCH_THRESHOLD,
            new_identity_threshold: DEFAULT_NEW_IDENTITY_THRESHOLD,
            max_sample_faces: DEFAULT_MAX_SAMPLE_FACES,
            crop_padding: DEFAULT_CROP_PADDING,
            frame_timeout_ms: DEFAULT_FRAME_TIMEOUT_MS,
            detection_workers: 1,
            detector_confidence: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Platform config location, e.g. `~/.config/FaceGraph/analysis.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceGraph").join("analysis.json"))
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let json = fs::read_to_string(path).map_err(|e| {
            AnalysisError::Input(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            AnalysisError::Input(format!("malformed config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the platform config if present, falling back to defaults.
    pub fn load_or_default() -> Self {
        Self::default_path()
            .filter(|p| p.exists())
            .and_then(|p| match Self::load(&p) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("Ignoring config at {}: {e}", p.display());
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.chunk_duration_secs > 0.0) {
            return Err(invalid("chunk_duration_secs must be > 0", self.chunk_duration_secs));
        }
        if self.frame_skip < 1 {
            return Err(AnalysisError::Input("frame_skip must be >= 1".into()));
        }
        if !(self.detection_scale > 0.0 && self.detection_scale <= 1.0) {
            return Err(invalid("detection_scale must be in (0, 1]", self.detection_scale));
        }
        if !(self.reference_face_area > 0.0) {
            return Err(invalid("reference_face_area must be > 0", self.reference_face_area));
        }
        for (name, value) in [
            ("face_grouping_threshold", self.face_grouping_threshold),
            ("face_match_threshold", self.face_match_threshold),
            ("new_identity_threshold", self.new_identity_threshold),
            ("detector_confidence", self.detector_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::Input(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if self.detection_workers < 1 {
            return Err(AnalysisError::Input("detection_workers must be >= 1".into()));
        }
        if self.frame_timeout_ms == 0 {
            return Err(AnalysisError::Input("frame_timeout_ms must be > 0".into()));
        }
        Ok(())
    }
}

fn invalid(message: &str, value: f64) -> AnalysisError {
    AnalysisError::Input(format!("{message}, got {value}"))
}
