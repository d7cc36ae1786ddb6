pub mod math;
pub mod onnx_face_encoder;
pub mod onnx_session;
pub mod onnx_yolo_locator;
