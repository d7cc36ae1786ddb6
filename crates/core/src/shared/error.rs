use thiserror::Error;

/// Failure taxonomy for one video's analysis.
///
/// Any variant returned from the pipeline is terminal for that video.
/// An unmatched face is not an error: it either becomes a new identity or is
/// dropped from the chunk.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Unusable input: unparseable or zero-duration video, bad configuration,
    /// or an embedding whose dimension disagrees with the identity pool.
    #[error("invalid input: {0}")]
    Input(String),

    /// A backend (decode, transcode, detection, upload) failed for a unit of
    /// work that cannot be skipped.
    #[error("{stage} failed: {message}")]
    Capability { stage: &'static str, message: String },

    /// A reference photo contained no detectable face.
    #[error("no face found in reference image for identity {identity_id}")]
    NoFace { identity_id: String },

    /// Identity or analysis persistence failed.
    #[error("store error: {0}")]
    Store(String),

    #[error("pipeline already executed")]
    AlreadyExecuted,

    #[error("invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl AnalysisError {
    pub fn capability(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Capability {
            stage,
            message: err.to_string(),
        }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}
