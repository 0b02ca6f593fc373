use crate::shared::bounds::Bounds;
use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::{ContactId, TrackId};

/// A face lifecycle notification from the recognition engine.
///
/// Per track the engine emits `Show`, then any number of `Move`, then `Hide`.
#[derive(Clone, Debug, PartialEq)]
pub enum SightingEvent {
    Show {
        track_id: TrackId,
        bounds: Bounds,
        encoding: Option<FaceEncoding>,
        /// Set when the engine already matched the face to a contact.
        contact_id: Option<ContactId>,
    },
    Move {
        track_id: TrackId,
        bounds: Bounds,
    },
    Hide {
        track_id: TrackId,
    },
}

impl SightingEvent {
    pub fn track_id(&self) -> TrackId {
        match self {
            SightingEvent::Show { track_id, .. }
            | SightingEvent::Move { track_id, .. }
            | SightingEvent::Hide { track_id } => *track_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SightingEvent::Show { .. } => "show",
            SightingEvent::Move { .. } => "move",
            SightingEvent::Hide { .. } => "hide",
        }
    }
}
