use serde::{Deserialize, Serialize};

use crate::shared::bounds::Bounds;
use crate::shared::encoding::FaceEncoding;
use crate::shared::frame::Frame;

/// One face found in a frame, with its embedding when the backend computes one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounds: Bounds,
    #[serde(default)]
    pub encoding: Option<FaceEncoding>,
}

/// Domain interface for the native detect-and-embed backend.
///
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
