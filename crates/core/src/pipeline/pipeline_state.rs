use std::fmt;

use crate::shared::error::AnalysisError;

/// Lifecycle of one video's analysis.
///
/// Stages run strictly forward and none is re-entered; `Failed` is reachable
/// from any non-terminal stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    LoadingIdentities,
    Segmenting,
    ProcessingChunks,
    Aggregating,
    Done,
    Failed,
}

impl PipelineState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::LoadingIdentities => "loading_identities",
            Self::Segmenting => "segmenting",
            Self::ProcessingChunks => "processing_chunks",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    fn successor(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::LoadingIdentities),
            Self::LoadingIdentities => Some(Self::Segmenting),
            Self::Segmenting => Some(Self::ProcessingChunks),
            Self::ProcessingChunks => Some(Self::Aggregating),
            Self::Aggregating => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Moves to `next`, which must be the immediate successor or `Failed`.
    pub fn advance(&mut self, next: Self) -> Result<(), AnalysisError> {
        let allowed = match next {
            Self::Failed => !self.is_terminal(),
            _ => self.successor() == Some(next),
        };
        if !allowed {
            return Err(AnalysisError::InvalidTransition {
                from: self.name(),
                to: next.name(),
            });
        }
        log::debug!("Pipeline {} -> {}", self.name(), next.name());
        *self = next;
        Ok(())
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
