use crate::common::QualityConfig;
use crate::core::detection::Detection;
use std::fmt;

/// Gate decision for one detection tick. Rejections are feedback, not
/// errors; scanning continues until a detection is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityVerdict {
    Accepted,
    RejectedLowScore,
    RejectedSmallFace,
    NoFaceFound,
}

/// Classify a detection against the configured thresholds.
///
/// A detection is accepted when its confidence reaches `min_score` and the
/// face box is at least `min_face_size_px` in both dimensions. The score
/// check takes precedence when both fail.
pub fn evaluate(detection: Option<&Detection>, thresholds: &QualityConfig) -> QualityVerdict {
    let Some(detection) = detection else {
        return QualityVerdict::NoFaceFound;
    };

    if detection.score < thresholds.min_score {
        return QualityVerdict::RejectedLowScore;
    }

    let face = &detection.bounding_box;
    if face.width < thresholds.min_face_size_px || face.height < thresholds.min_face_size_px {
        return QualityVerdict::RejectedSmallFace;
    }

    QualityVerdict::Accepted
}

impl QualityVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, QualityVerdict::Accepted)
    }

    /// Short guidance for the person in front of the camera.
    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            QualityVerdict::Accepted => &[],
            QualityVerdict::RejectedLowScore => &[
                "Improve the lighting on your face",
                "Face the camera directly",
                "Avoid shadows across your face",
                "Keep a neutral expression",
            ],
            QualityVerdict::RejectedSmallFace => &[
                "Move closer to the camera (30-50 cm works well)",
                "Your face should fill most of the frame",
            ],
            QualityVerdict::NoFaceFound => &["Position yourself in front of the camera"],
        }
    }
}

impl fmt::Display for QualityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            QualityVerdict::Accepted => "quality good",
            QualityVerdict::RejectedLowScore => "adjusting (low detection score)",
            QualityVerdict::RejectedSmallFace => "adjusting (face too small)",
            QualityVerdict::NoFaceFound => "looking for a face...",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> QualityConfig {
        QualityConfig::default()
    }

    fn detection(score: f32, width: f32, height: f32) -> Detection {
        Detection::new(score, width, height, vec![0.0; 128])
    }

    #[test]
    fn good_detection_is_accepted() {
        let d = detection(0.95, 200.0, 200.0);
        assert_eq!(evaluate(Some(&d), &thresholds()), QualityVerdict::Accepted);
    }

    #[test]
    fn boundary_values_are_accepted() {
        let d = detection(0.9, 150.0, 150.0);
        assert_eq!(evaluate(Some(&d), &thresholds()), QualityVerdict::Accepted);
    }

    #[test]
    fn low_score_is_rejected_regardless_of_size() {
        let d = detection(0.5, 200.0, 200.0);
        assert_eq!(
            evaluate(Some(&d), &thresholds()),
            QualityVerdict::RejectedLowScore
        );
    }

    #[test]
    fn low_score_wins_over_small_face() {
        let d = detection(0.5, 50.0, 50.0);
        assert_eq!(
            evaluate(Some(&d), &thresholds()),
            QualityVerdict::RejectedLowScore
        );
    }

    #[test]
    fn undersized_width_is_rejected() {
        let d = detection(0.95, 149.0, 200.0);
        assert_eq!(
            evaluate(Some(&d), &thresholds()),
            QualityVerdict::RejectedSmallFace
        );
    }

    #[test]
    fn undersized_height_is_rejected() {
        let d = detection(0.95, 200.0, 149.0);
        assert_eq!(
            evaluate(Some(&d), &thresholds()),
            QualityVerdict::RejectedSmallFace
        );
    }

    #[test]
    fn absent_detection_yields_no_face_found() {
        assert_eq!(evaluate(None, &thresholds()), QualityVerdict::NoFaceFound);
    }

    #[test]
    fn custom_thresholds_are_honored() {
        let lenient = QualityConfig {
            min_score: 0.5,
            min_face_size_px: 80.0,
        };
        let d = detection(0.6, 100.0, 100.0);
        assert_eq!(evaluate(Some(&d), &lenient), QualityVerdict::Accepted);
    }

    #[test]
    fn rejections_carry_hints() {
        assert!(!QualityVerdict::RejectedLowScore.hints().is_empty());
        assert!(!QualityVerdict::RejectedSmallFace.hints().is_empty());
        assert!(QualityVerdict::Accepted.hints().is_empty());
    }
}
