/// ArcFace embedding encoder using ONNX Runtime.
///
/// Each face box is cropped from the full-resolution frame, resized to
/// 112x112 and normalized before inference. Outputs are L2-normalized so
/// Euclidean distances fall in `[0, 2]`.
use std::path::Path;

use crate::detection::domain::face_encoder::FaceEncoder;
use crate::detection::infrastructure::onnx_session::{open_session, static_dim};
use crate::shared::embedding::{l2_normalize, Embedding};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Output width of the bundled ArcFace model.
const DEFAULT_DIMENSION: usize = 512;

pub struct OnnxFaceEncoder {
    session: ort::session::Session,
    dimension: usize,
}

impl OnnxFaceEncoder {
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path, intra_threads)?;
        let dimension = static_dim(&session, true, 1).unwrap_or(DEFAULT_DIMENSION);
        Ok(Self { session, dimension })
    }

    fn embed(&mut self, crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let mut values = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        if values.len() != self.dimension {
            return Err(format!(
                "encoder produced {} values, expected {}",
                values.len(),
                self.dimension
            )
            .into());
        }
        l2_normalize(&mut values);
        Ok(Embedding::new(values))
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(
        &mut self,
        frame: &Frame,
        boxes: &[FaceBox],
    ) -> Result<Vec<Embedding>, Box<dyn std::error::Error>> {
        boxes
            .iter()
            .map(|b| {
                let crop = frame.crop(b);
                if crop.is_empty() {
                    return Err(format!("face box {b:?} lies outside the frame").into());
                }
                self.embed(&crop)
            })
            .collect()
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src = crop.as_ndarray();
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn solid(value: u8, w: u32, h: u32) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h, 3, 0)
    }

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess(&solid(128, 50, 30));
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[rstest]
    #[case::mid(127, (127.0 - 127.5) / 127.5)]
    #[case::max(255, 1.0)]
    #[case::min(0, -1.0)]
    fn test_preprocess_normalization(#[case] value: u8, #[case] expected: f32) {
        let tensor = preprocess(&solid(value, 10, 10));
        assert_relative_eq!(tensor[[0, 0, 0, 0]], expected, epsilon = 0.01);
    }

    #[test]
    fn test_preprocess_upsamples_tiny_crop() {
        let mut frame = solid(0, 2, 1);
        frame.data_mut()[3] = 255; // right pixel, R
        let tensor = preprocess(&frame);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], -1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 111]], 1.0, epsilon = 0.01);
    }
}
