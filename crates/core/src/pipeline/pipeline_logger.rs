use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for analysis progress, per-stage timings and counters.
///
/// The use case reports through this trait so the CLI can print a run
/// summary while library callers stay silent.
pub trait PipelineLogger: Send {
    /// Chunk-level progress: `current` of `total` chunks finished.
    fn progress(&mut self, current: usize, total: usize);

    /// Duration of one stage for one chunk (`segment`, `upload`, `detect`,
    /// `cluster`, `match`).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time counter, e.g. faces or clusters in a chunk.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Routes events to the `log` facade and keeps per-stage samples for a
/// closing summary.
pub struct StdoutPipelineLogger {
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    chunks_done: usize,
    total_chunks: usize,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            chunks_done: 0,
            total_chunks: 0,
        }
    }

    /// Formatted report, or `None` before anything was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Analysis summary ({}/{} chunks, {:.1}s total):",
            self.chunks_done,
            self.total_chunks,
            elapsed_ms / 1000.0
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)",
                mean(durations)
            ));
        }

        for (name, values) in &self.metrics {
            let total: f64 = values.iter().sum();
            lines.push(format!("  {name}: avg {:.1}, total {total:.0}", mean(values)));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.chunks_done = current;
        self.total_chunks = total;
        if total > 0 {
            log::info!(
                "Processed chunk {current}/{total} ({:.0}%)",
                current as f64 / total as f64 * 100.0
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 4);
        logger.timing("detect", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_per_stage() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("match", 5.0);

        assert_eq!(logger.timings_for("detect").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("match").unwrap(), &[5.0]);
        assert!(logger.timings_for("cluster").is_none());
    }

    #[test]
    fn test_metric_average() {
        let mut logger = StdoutPipelineLogger::new();
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);
        assert_relative_eq!(mean(logger.metrics_for("faces").unwrap()), 3.5);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new();
        logger.progress(2, 2);
        logger.timing("detect", 10.0);
        logger.metric("clusters", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("2/2 chunks"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("clusters: avg 2.0, total 2"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(StdoutPipelineLogger::new().summary_string().is_none());
    }
}
