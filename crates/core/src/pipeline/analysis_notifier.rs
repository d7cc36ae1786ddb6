use crate::pipeline::video_analysis::VideoAnalysis;

/// Hands a finished analysis to a downstream consumer.
///
/// Best-effort: implementations must not block the caller for long and
/// must swallow their own failures.
pub trait AnalysisNotifier: Send {
    fn notify(&self, analysis: &VideoAnalysis);
}
