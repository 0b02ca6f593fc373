use crate::shared::bounds::Bounds;
use crate::shared::ids::{ContactId, TrackId};

/// Who a track is, as far as the robot knows right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Unknown,
    Known { contact_id: ContactId, name: String },
}

impl Identity {
    pub fn is_known(&self) -> bool {
        matches!(self, Identity::Known { .. })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Identity::Known { name, .. } => Some(name),
            Identity::Unknown => None,
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Unknown => write!(f, "unknown"),
            Identity::Known { contact_id, name } => write!(f, "{name} (#{contact_id})"),
        }
    }
}

/// Callbacks exposed to the robot-control layer.
///
/// Invoked synchronously on the control-loop thread while a tick's event
/// batch is applied; implementations must not block.
pub trait FaceObserver {
    fn on_show(&mut self, track_id: TrackId, bounds: Bounds, identity: &Identity);

    fn on_move(&mut self, track_id: TrackId, bounds: Bounds, identity: &Identity);

    fn on_hide(&mut self, track_id: TrackId, identity: &Identity);
}
