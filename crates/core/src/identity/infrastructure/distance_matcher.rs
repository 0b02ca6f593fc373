use crate::identity::domain::encoding_matcher::EncodingMatcher;
use crate::shared::constants::DEFAULT_MATCH_TOLERANCE;
use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::ContactId;

/// Nearest-neighbour matcher over squared Euclidean distance.
///
/// The tolerance is a Euclidean distance; a query matches the closest
/// enrolled encoding whose squared distance is at most `tolerance²`. Ties
/// keep the earlier candidate.
pub struct DistanceMatcher {
    tolerance: f64,
    max_distance_squared: f64,
}

impl DistanceMatcher {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            max_distance_squared: tolerance * tolerance,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for DistanceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_TOLERANCE)
    }
}

impl EncodingMatcher for DistanceMatcher {
    fn best_match(
        &self,
        query: &FaceEncoding,
        enrolled: &[(ContactId, &FaceEncoding)],
    ) -> Option<ContactId> {
        let mut best: Option<(ContactId, f64)> = None;
        for (id, encoding) in enrolled {
            let Some(dist) = query.distance_squared(encoding) else {
                continue;
            };
            if dist > self.max_distance_squared {
                continue;
            }
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((*id, dist));
            }
        }
        best.map(|(id, _)| id)
    }
}
