use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU when the platform provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Opens an inference session with `intra_threads` worker threads.
///
/// Each detection worker owns its own session, so callers running several
/// workers should split the available cores between them.
pub fn open_session(model_path: &Path, intra_threads: usize) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads.max(1))?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    log::debug!("Loaded ONNX model {}", model_path.display());
    Ok(session)
}

/// Reads dimension `axis` of the first input or output tensor, if static.
pub fn static_dim(session: &Session, output: bool, axis: usize) -> Option<usize> {
    let value_type = if output {
        session.outputs().first()?.dtype()
    } else {
        session.inputs().first()?.dtype()
    };
    match value_type {
        ort::value::ValueType::Tensor { shape, .. } if shape.len() > axis && shape[axis] > 0 => {
            Some(shape[axis] as usize)
        }
        _ => None,
    }
}
