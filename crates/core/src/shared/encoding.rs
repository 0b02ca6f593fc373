use serde::{Deserialize, Serialize};

use super::constants::ENCODING_DIMENSIONS;

/// Opaque face feature vector produced by the external recognizer.
///
/// The native embedder emits [`ENCODING_DIMENSIONS`] values. Matching does
/// not rely on it: vectors of different lengths simply never compare as close.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceEncoding(Vec<f64>);

impl FaceEncoding {
    pub fn new(vector: Vec<f64>) -> Self {
        Self(vector)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this has the native embedder's dimensionality.
    pub fn is_native_length(&self) -> bool {
        self.0.len() == ENCODING_DIMENSIONS
    }

    /// Squared Euclidean distance, or `None` when dimensions differ.
    pub fn distance_squared(&self, other: &FaceEncoding) -> Option<f64> {
        if self.0.len() != other.0.len() {
            return None;
        }
        Some(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (b - a) * (b - a))
                .sum(),
        )
    }
}

impl From<Vec<f64>> for FaceEncoding {
    fn from(vector: Vec<f64>) -> Self {
        Self(vector)
    }
}
