pub mod http_analysis_notifier;
pub mod json_analysis_store;
pub mod sequential_detection_executor;
pub mod threaded_detection_executor;
