use std::collections::HashMap;
use std::sync::Arc;

use crate::shared::frame::Frame;
use crate::vision::domain::face_detector::{Detection, FaceDetector};

/// Replays scripted detections by frame index.
///
/// Stands in for the native backend when driving the loop from a recorded
/// or hand-written scenario. Frames with no entry yield no faces.
pub struct ReplayFaceDetector {
    script: Arc<HashMap<usize, Vec<Detection>>>,
}

impl ReplayFaceDetector {
    pub fn new(script: Arc<HashMap<usize, Vec<Detection>>>) -> Self {
        Self { script }
    }

    /// Builds a script where position `i` holds the faces seen in frame `i`.
    pub fn from_frames(frames: Vec<Vec<Detection>>) -> Self {
        Self::new(Arc::new(frames.into_iter().enumerate().collect()))
    }
}

impl FaceDetector for ReplayFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        Ok(self.script.get(&frame.index()).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounds::Bounds;

    fn det(left: i32) -> Detection {
        Detection {
            bounds: Bounds::new(left, 20, left + 50, 70).unwrap(),
            encoding: None,
        }
    }

    #[test]
    fn test_returns_scripted_detections_for_known_frame() {
        let mut detector = ReplayFaceDetector::from_frames(vec![vec![det(10), det(60)]]);
        let result = detector.detect(&Frame::blank(4, 4, 0)).unwrap();
        assert_eq!(result, vec![det(10), det(60)]);
    }

    #[test]
    fn test_returns_empty_for_unscripted_frame() {
        let mut detector = ReplayFaceDetector::from_frames(vec![vec![det(10)]]);
        assert!(detector.detect(&Frame::blank(4, 4, 5)).unwrap().is_empty());
    }

    #[test]
    fn test_shared_script_between_detectors() {
        let script = Arc::new(HashMap::from([(3, vec![det(10)])]));
        let mut a = ReplayFaceDetector::new(script.clone());
        let mut b = ReplayFaceDetector::new(script);
        let frame = Frame::blank(4, 4, 3);
        assert_eq!(a.detect(&frame).unwrap(), b.detect(&frame).unwrap());
    }

    #[test]
    fn test_detection_deserializes_without_encoding() {
        let d: Detection = serde_json::from_str(r#"{ "bounds": [10, 20, 60, 70] }"#).unwrap();
        assert_eq!(d, det(10));
    }
}
