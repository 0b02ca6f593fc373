use serde::{Deserialize, Serialize};

/// Recognizer-assigned face track identifier.
///
/// Unique only among currently visible faces; the engine reuses an id once
/// its track has been hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

/// Stable contact identifier.
///
/// Positive ids come from the persisted roster, negative ids are allocated
/// by provisional inserts, and zero means "no contact".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl ContactId {
    pub fn is_user_assigned(self) -> bool {
        self.0 > 0
    }

    pub fn is_provisional(self) -> bool {
        self.0 < 0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
