use crate::shared::constants::DURATION_EPSILON;

/// Time range of one chunk within the source video, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkSpan {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
}

impl ChunkSpan {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A fixed-duration, independently decodable segment of a source video.
///
/// `media_bytes` is a self-contained re-encoded clip, not a byte slice of
/// the source. The pipeline consumes each chunk once and drops it.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub id: String,
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub media_bytes: Vec<u8>,
}

impl Chunk {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Splits `[0, total_duration)` into contiguous spans of `chunk_duration`.
///
/// Produces `ceil(total / chunk)` spans; the last one is shorter when the
/// total is not a multiple. A remainder within [`DURATION_EPSILON`] is
/// absorbed instead of producing a degenerate trailing span.
pub fn plan_chunks(total_duration: f64, chunk_duration: f64) -> Vec<ChunkSpan> {
    if !(total_duration > 0.0) || !(chunk_duration > 0.0) {
        return Vec::new();
    }
    let count = (((total_duration - DURATION_EPSILON) / chunk_duration).ceil() as usize).max(1);
    (0..count)
        .map(|index| {
            let start_time = index as f64 * chunk_duration;
            let end_time = if index + 1 == count {
                total_duration
            } else {
                ((index + 1) as f64 * chunk_duration).min(total_duration)
            };
            ChunkSpan {
                index,
                start_time,
                end_time,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::exact_multiple(10.0, 5.0, 2)]
    #[case::remainder(12.0, 5.0, 3)]
    #[case::shorter_than_chunk(3.2, 5.0, 1)]
    #[case::exactly_one(5.0, 5.0, 1)]
    #[case::long(61.0, 5.0, 13)]
    #[case::float_noise(10.000_000_1, 5.0, 2)]
    fn test_chunk_count(#[case] total: f64, #[case] len: f64, #[case] expected: usize) {
        assert_eq!(plan_chunks(total, len).len(), expected);
    }

    #[rstest]
    #[case(12.0)]
    #[case(7.3)]
    #[case(29.97)]
    #[case(100.0)]
    fn test_spans_cover_duration_contiguously(#[case] total: f64) {
        let spans = plan_chunks(total, 5.0);
        let sum: f64 = spans.iter().map(ChunkSpan::duration).sum();
        assert_relative_eq!(sum, total, epsilon = DURATION_EPSILON);

        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.index, i);
            if i > 0 {
                assert_relative_eq!(span.start_time, spans[i - 1].end_time);
            }
        }
    }

    #[test]
    fn test_last_chunk_is_remainder() {
        let spans = plan_chunks(12.0, 5.0);
        assert_relative_eq!(spans[2].start_time, 10.0);
        assert_relative_eq!(spans[2].duration(), 2.0);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    fn test_unusable_duration_plans_nothing(#[case] total: f64) {
        assert!(plan_chunks(total, 5.0).is_empty());
    }
}
