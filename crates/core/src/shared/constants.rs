pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const DEFAULT_CHUNK_DURATION_SECS: f64 = 5.0;
pub const DEFAULT_FRAME_SKIP: usize = 3;
pub const DEFAULT_DETECTION_SCALE: f64 = 0.5;

/// Faces narrower or shorter than this produce unreliable embeddings.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 20;

/// Box area at which the size term of the quality score saturates.
pub const DEFAULT_REFERENCE_FACE_AREA: f64 = 5000.0;

/// Cosine distance below which two faces in one chunk are the same person
/// (similarity above 0.5). Stricter than matching, so a crowded chunk does
/// not merge neighbours.
pub const DEFAULT_FACE_GROUPING_THRESHOLD: f64 = 0.5;
/// Minimum cosine similarity to a known identity, the usual ArcFace
/// verification cut-off.
pub const DEFAULT_FACE_MATCH_THRESHOLD: f64 = 0.4;
/// Minimum face quality for an unmatched face to become an identity.
pub const DEFAULT_NEW_IDENTITY_THRESHOLD: f64 = 0.5;

pub const DEFAULT_MAX_SAMPLE_FACES: usize = 3;
pub const DEFAULT_CROP_PADDING: u32 = 30;
pub const DEFAULT_FRAME_TIMEOUT_MS: u64 = 10_000;

/// Frame-accuracy tolerance when comparing chunk durations.
pub const DURATION_EPSILON: f64 = 1e-6;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
