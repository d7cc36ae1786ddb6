/// YOLO face locator using ONNX Runtime via `ort`.
///
/// Letterboxes the frame to the model's square input, runs inference, and
/// suppresses overlapping boxes. Landmark outputs, when the model has them,
/// are ignored.
use std::path::Path;

use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::infrastructure::math::non_max_suppression;
use crate::detection::infrastructure::onnx_session::{open_session, static_dim};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Fallback input resolution when the model shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESH: f64 = 0.45;

/// YOLO letterbox pad value.
const PAD_GRAY: f32 = 114.0 / 255.0;

pub struct OnnxYoloLocator {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloLocator {
    pub fn new(
        model_path: &Path,
        confidence: f64,
        intra_threads: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path, intra_threads)?;
        // NCHW: [1, 3, H, W]
        let input_size = static_dim(&session, false, 2)
            .map(|d| d as u32)
            .unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceLocator for OnnxYoloLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(letterboxed.tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let candidates = parse_candidates(data, &shape, self.confidence, &letterboxed);
        Ok(non_max_suppression(candidates, NMS_IOU_THRESH)
            .into_iter()
            .map(|([x1, y1, x2, y2], _)| {
                FaceBox::from_corners(x1, y1, x2, y2).clamped(frame.width(), frame.height())
            })
            .collect())
    }
}

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

/// Letterbox-resize a frame to `target_size` x `target_size`, NCHW float32.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_GRAY,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

/// Decodes `[cx, cy, w, h, conf, ...]` rows into frame-space corner boxes.
///
/// Accepts both `[1, features, detections]` and `[1, detections, features]`.
fn parse_candidates(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
    lb: &Letterboxed,
) -> Vec<([f64; 4], f64)> {
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Vec::new();
    }
    let at = |det: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data.get(i).copied().unwrap_or(0.0) as f64
    };

    let unpad_x = |v: f64| (v - lb.pad_x as f64) / lb.scale;
    let unpad_y = |v: f64| (v - lb.pad_y as f64) / lb.scale;

    (0..num_dets)
        .filter_map(|i| {
            let conf = at(i, 4);
            if conf < min_confidence {
                return None;
            }
            let (cx, cy, w, h) = (at(i, 0), at(i, 1), at(i, 2), at(i, 3));
            Some((
                [
                    unpad_x(cx - w / 2.0),
                    unpad_y(cy - h / 2.0),
                    unpad_x(cx + w / 2.0),
                    unpad_y(cy + h / 2.0),
                ],
                conf,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 -> scale 3.2, content 640x320, pad_y 160
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let lb = letterbox(&frame, 640);

        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_pads_with_gray_and_normalizes_content() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let lb = letterbox(&frame, 640);
        let y = lb.pad_y as usize + 1;
        assert_relative_eq!(lb.tensor[[0, 0, y, 1]], 1.0, epsilon = 0.01);
        assert_relative_eq!(lb.tensor[[0, 0, 0, 0]], PAD_GRAY, epsilon = 0.01);
    }

    fn identity_letterbox() -> Letterboxed {
        Letterboxed {
            tensor: ndarray::Array4::zeros((1, 3, 1, 1)),
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        }
    }

    /// Six detections; only the first clears a 0.5 confidence.
    fn rows() -> Vec<[f32; 5]> {
        let mut rows = vec![[50.0, 50.0, 20.0, 20.0, 0.9]];
        rows.extend((0..5).map(|i| [10.0 * i as f32, 10.0, 4.0, 4.0, 0.1]));
        rows
    }

    #[test]
    fn test_parse_row_major_layout() {
        let data: Vec<f32> = rows().into_iter().flatten().collect();
        let boxes = parse_candidates(&data, &[1, 6, 5], 0.5, &identity_letterbox());
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].0, [40.0, 40.0, 60.0, 60.0]);
    }

    #[test]
    fn test_parse_transposed_layout() {
        let rows = rows();
        let data: Vec<f32> = (0..5)
            .flat_map(|f| rows.iter().map(move |r| r[f]))
            .collect();
        let boxes = parse_candidates(&data, &[1, 5, 6], 0.5, &identity_letterbox());
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].0, [40.0, 40.0, 60.0, 60.0]);
    }

    #[test]
    fn test_parse_undoes_letterbox() {
        let lb = Letterboxed {
            tensor: ndarray::Array4::zeros((1, 3, 1, 1)),
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        let mut data = vec![40.0, 140.0, 20.0, 20.0, 0.8];
        data.extend(std::iter::repeat(0.0).take(5 * 5));
        let boxes = parse_candidates(&data, &[1, 6, 5], 0.5, &lb);
        assert_eq!(boxes[0].0, [15.0, 15.0, 25.0, 25.0]);
    }
}
