use crate::shared::face_box::FaceBox;

const SIZE_WEIGHT: f64 = 0.7;
const ASPECT_WEIGHT: f64 = 0.3;
const MIN_QUALITY: f64 = 0.1;
const MAX_QUALITY: f64 = 1.0;

/// Deterministic quality score from box geometry alone.
///
/// Larger, squarer boxes score higher. The size term saturates once the box
/// area reaches `reference_area`.
pub fn face_quality(bbox: &FaceBox, reference_area: f64) -> f64 {
    let size_confidence = (bbox.area() / reference_area).clamp(0.0, 1.0);
    let w = bbox.width() as f64;
    let h = bbox.height() as f64;
    let aspect_confidence = if w > 0.0 && h > 0.0 {
        w.min(h) / w.max(h)
    } else {
        0.0
    };
    (SIZE_WEIGHT * size_confidence + ASPECT_WEIGHT * aspect_confidence)
        .clamp(MIN_QUALITY, MAX_QUALITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_large_square_face_is_max_quality() {
        let b = FaceBox::new(0, 100, 100, 0);
        assert_relative_eq!(face_quality(&b, 5000.0), 1.0);
    }

    #[test]
    fn test_small_square_face() {
        // 50x50 = 2500 -> size 0.5, aspect 1.0
        let b = FaceBox::new(0, 50, 50, 0);
        assert_relative_eq!(face_quality(&b, 5000.0), 0.7 * 0.5 + 0.3);
    }

    #[test]
    fn test_elongated_face_is_penalized() {
        // 100x25 = 2500 -> size 0.5, aspect 0.25
        let b = FaceBox::new(0, 100, 25, 0);
        assert_relative_eq!(face_quality(&b, 5000.0), 0.7 * 0.5 + 0.3 * 0.25);
    }

    #[rstest]
    #[case::empty(FaceBox::new(0, 0, 0, 0))]
    #[case::sliver(FaceBox::new(0, 1, 40, 0))]
    fn test_floor_is_applied(#[case] bbox: FaceBox) {
        assert!(face_quality(&bbox, 5000.0) >= MIN_QUALITY);
    }

    #[test]
    fn test_reference_area_scales_size_term() {
        let b = FaceBox::new(0, 50, 50, 0);
        assert!(face_quality(&b, 2500.0) > face_quality(&b, 10_000.0));
    }
}
