use ndarray::ArrayView3;

use crate::shared::face_box::FaceBox;

/// A single decoded frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// True when the frame carries no decodable pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Nearest-neighbor downscale by `scale` (expected in `(0, 1]`).
    ///
    /// The result keeps the source frame index so detections can be
    /// attributed back to the full-resolution frame.
    pub fn downscale(&self, scale: f64) -> Frame {
        if scale >= 1.0 || self.is_empty() {
            return self.clone();
        }
        let new_w = ((self.width as f64 * scale) as u32).max(1);
        let new_h = ((self.height as f64 * scale) as u32).max(1);
        let channels = self.channels as usize;
        let src = self.as_ndarray();
        let src_w = self.width as usize;
        let src_h = self.height as usize;

        let mut data = Vec::with_capacity(new_w as usize * new_h as usize * channels);
        for y in 0..new_h as usize {
            let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
            for x in 0..new_w as usize {
                let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
                for c in 0..channels {
                    data.push(src[[src_y, src_x, c]]);
                }
            }
        }

        Frame::new(data, new_w, new_h, self.channels, self.index)
    }

    /// Copies the pixels under `bbox`, clamped to the frame bounds.
    pub fn crop(&self, bbox: &FaceBox) -> Frame {
        let clamped = bbox.clamped(self.width, self.height);
        let x1 = clamped.left.max(0) as usize;
        let y1 = clamped.top.max(0) as usize;
        let x2 = clamped.right.max(0) as usize;
        let y2 = clamped.bottom.max(0) as usize;

        let crop_w = x2.saturating_sub(x1);
        let crop_h = y2.saturating_sub(y1);
        let channels = self.channels as usize;

        let mut data = Vec::with_capacity(crop_w * crop_h * channels);
        if crop_w > 0 && crop_h > 0 {
            let src = self.as_ndarray();
            for row in y1..y2 {
                for col in x1..x2 {
                    for c in 0..channels {
                        data.push(src[[row, col, c]]);
                    }
                }
            }
        }

        Frame::new(data, crop_w as u32, crop_h as u32, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
