use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::ContactId;

/// A persistent, named identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: ContactId,
    pub display_name: String,
    /// Set once at enrollment and never replaced.
    #[serde(default)]
    pub enrollment_encoding: Option<FaceEncoding>,
    #[serde(default)]
    pub first_seen_at: Option<SystemTime>,
    #[serde(default)]
    pub last_seen_at: Option<SystemTime>,
}

impl Contact {
    pub fn new(
        contact_id: ContactId,
        display_name: impl Into<String>,
        enrollment_encoding: Option<FaceEncoding>,
    ) -> Self {
        Self {
            contact_id,
            display_name: display_name.into(),
            enrollment_encoding,
            first_seen_at: None,
            last_seen_at: None,
        }
    }

    /// Records a resolved sighting. `last_seen_at` never moves backwards.
    pub fn mark_seen(&mut self, at: SystemTime) {
        if self.first_seen_at.is_none() {
            self.first_seen_at = Some(at);
        }
        match self.last_seen_at {
            Some(last) if last >= at => {}
            _ => self.last_seen_at = Some(at),
        }
    }
}
