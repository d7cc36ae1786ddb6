use crate::shared::frame::Frame;

/// Picks every `frame_skip`-th decoded frame of a chunk, starting at 0.
///
/// Selection is by decode position, so a corrupt or empty frame at a
/// selected position is skipped rather than replaced by its neighbour.
#[derive(Clone, Copy, Debug)]
pub struct FrameSampler {
    frame_skip: usize,
}

impl FrameSampler {
    pub fn new(frame_skip: usize) -> Result<Self, &'static str> {
        if frame_skip < 1 {
            return Err("frame_skip must be >= 1");
        }
        Ok(Self { frame_skip })
    }

    pub fn frame_skip(&self) -> usize {
        self.frame_skip
    }

    /// Lazily selects `(original_index, frame)` pairs from decoded frames.
    ///
    /// Borrowing the slice makes the selection restartable: calling this
    /// again yields the same sequence.
    pub fn select<'a>(&self, frames: &'a [Frame]) -> impl Iterator<Item = (usize, &'a Frame)> + 'a {
        frames
            .iter()
            .enumerate()
            .step_by(self.frame_skip)
            .filter(|(_, f)| !f.is_empty())
    }

    /// Streaming variant over a decoder's output.
    ///
    /// Frames between selected positions are pulled but dropped
    /// immediately; decode errors at selected positions are logged and
    /// skipped.
    pub fn sample<I>(&self, decoded: I) -> SampledFrames<I>
    where
        I: Iterator<Item = Result<Frame, Box<dyn std::error::Error>>>,
    {
        SampledFrames {
            inner: decoded,
            frame_skip: self.frame_skip,
            position: 0,
        }
    }
}

pub struct SampledFrames<I> {
    inner: I,
    frame_skip: usize,
    position: usize,
}

impl<I> Iterator for SampledFrames<I>
where
    I: Iterator<Item = Result<Frame, Box<dyn std::error::Error>>>,
{
    type Item = (usize, Frame);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.inner.next()?;
            let index = self.position;
            self.position += 1;
            if index % self.frame_skip != 0 {
                continue;
            }
            match item {
                Ok(frame) if !frame.is_empty() => return Some((index, frame)),
                Ok(_) => log::debug!("Skipping empty frame {index}"),
                Err(e) => log::warn!("Skipping undecodable frame {index}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::new(vec![0u8; 3], 1, 1, 3, i))
            .collect()
    }

    fn empty(index: usize) -> Frame {
        Frame::new(Vec::new(), 0, 0, 3, index)
    }

    #[rstest]
    #[case::every_frame(1, vec![0, 1, 2, 3, 4, 5, 6])]
    #[case::stride_two(2, vec![0, 2, 4, 6])]
    #[case::stride_three(3, vec![0, 3, 6])]
    #[case::stride_larger_than_chunk(10, vec![0])]
    fn test_select_stride(#[case] skip: usize, #[case] expected: Vec<usize>) {
        let input = frames(7);
        let sampler = FrameSampler::new(skip).unwrap();
        let picked: Vec<usize> = sampler.select(&input).map(|(i, _)| i).collect();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_select_is_restartable() {
        let input = frames(9);
        let sampler = FrameSampler::new(3).unwrap();
        let first: Vec<usize> = sampler.select(&input).map(|(i, _)| i).collect();
        let second: Vec<usize> = sampler.select(&input).map(|(i, _)| i).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_select_skips_empty_frame_without_shifting() {
        let mut input = frames(7);
        input[3] = empty(3);
        let sampler = FrameSampler::new(3).unwrap();
        let picked: Vec<usize> = sampler.select(&input).map(|(i, _)| i).collect();
        assert_eq!(picked, vec![0, 6]);
    }

    #[test]
    fn test_select_empty_chunk() {
        let sampler = FrameSampler::new(2).unwrap();
        assert_eq!(sampler.select(&[]).count(), 0);
    }

    #[test]
    fn test_sample_skips_decode_errors() {
        let decoded: Vec<Result<Frame, Box<dyn std::error::Error>>> = vec![
            Ok(Frame::new(vec![0u8; 3], 1, 1, 3, 0)),
            Ok(Frame::new(vec![0u8; 3], 1, 1, 3, 1)),
            Err("corrupt packet".into()),
            Ok(Frame::new(vec![0u8; 3], 1, 1, 3, 3)),
            Ok(Frame::new(vec![0u8; 3], 1, 1, 3, 4)),
        ];
        let sampler = FrameSampler::new(2).unwrap();
        let picked: Vec<usize> = sampler.sample(decoded.into_iter()).map(|(i, _)| i).collect();
        assert_eq!(picked, vec![0, 4]);
    }

    #[test]
    fn test_sample_skips_empty_frames() {
        let decoded: Vec<Result<Frame, Box<dyn std::error::Error>>> =
            vec![Ok(empty(0)), Ok(Frame::new(vec![0u8; 3], 1, 1, 3, 1))];
        let sampler = FrameSampler::new(1).unwrap();
        let picked: Vec<usize> = sampler.sample(decoded.into_iter()).map(|(i, _)| i).collect();
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn test_zero_skip_rejected() {
        assert!(FrameSampler::new(0).is_err());
    }
}
