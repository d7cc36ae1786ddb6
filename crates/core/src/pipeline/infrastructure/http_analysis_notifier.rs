use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::pipeline::analysis_notifier::AnalysisNotifier;
use crate::pipeline::video_analysis::VideoAnalysis;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// POSTs the analysis as JSON from a detached thread.
pub struct HttpAnalysisNotifier {
    url: String,
}

impl HttpAnalysisNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Spawns the request and returns its handle; `notify` drops it.
    pub fn post_detached(&self, body: Vec<u8>) -> JoinHandle<()> {
        let url = self.url.clone();
        std::thread::spawn(move || {
            if let Err(e) = post(&url, body) {
                log::warn!("Analysis notification to {url} failed: {e}");
            }
        })
    }
}

fn post(url: &str, body: Vec<u8>) -> Result<(), reqwest::Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()?
        .error_for_status()?;
    log::debug!("Analysis notification accepted ({})", response.status());
    Ok(())
}

impl AnalysisNotifier for HttpAnalysisNotifier {
    fn notify(&self, analysis: &VideoAnalysis) {
        match serde_json::to_vec(analysis) {
            Ok(body) => {
                self.post_detached(body);
            }
            Err(e) => log::warn!("Could not serialize analysis for notification: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::time::Instant;

    fn analysis() -> VideoAnalysis {
        VideoAnalysis {
            video_id: "v".into(),
            owner: "o".into(),
            total_chunks: 0,
            identities: BTreeMap::new(),
            new_identities: Vec::new(),
            detections: Vec::new(),
        }
    }

    #[test]
    fn test_notify_returns_without_waiting() {
        let notifier = HttpAnalysisNotifier::new("http://127.0.0.1:9/analyze");
        let started = Instant::now();
        notifier.notify(&analysis());
        assert!(started.elapsed() < CONNECT_TIMEOUT);
    }

    #[test]
    fn test_failed_post_is_swallowed() {
        // Nothing listens on a port released by a dropped listener.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let notifier = HttpAnalysisNotifier::new(format!("http://127.0.0.1:{port}/analyze"));
        let handle = notifier.post_detached(b"{}".to_vec());
        assert!(handle.join().is_ok());
    }
}
