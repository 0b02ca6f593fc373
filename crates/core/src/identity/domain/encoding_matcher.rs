use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::ContactId;

/// The external recognizer's match routine.
///
/// Given a query and every enrolled encoding, returns the contact the query
/// belongs to, if any. The registry only orchestrates the call.
pub trait EncodingMatcher: Send {
    fn best_match(
        &self,
        query: &FaceEncoding,
        enrolled: &[(ContactId, &FaceEncoding)],
    ) -> Option<ContactId>;
}
