use crate::shared::bounds::Bounds;
use crate::shared::ids::TrackId;

use super::domain::face_observer::{FaceObserver, Identity};

/// Robot-control stand-in that reports every callback through `log`.
#[derive(Default)]
pub struct LoggingFaceObserver {
    shows: usize,
    hides: usize,
}

impl LoggingFaceObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faces shown but not yet hidden.
    pub fn visible(&self) -> usize {
        self.shows.saturating_sub(self.hides)
    }
}

impl FaceObserver for LoggingFaceObserver {
    fn on_show(&mut self, track_id: TrackId, bounds: Bounds, identity: &Identity) {
        self.shows += 1;
        log::info!("show track {track_id} at {bounds}: {identity}");
    }

    fn on_move(&mut self, track_id: TrackId, bounds: Bounds, identity: &Identity) {
        log::debug!("move track {track_id} to {bounds}: {identity}");
    }

    fn on_hide(&mut self, track_id: TrackId, identity: &Identity) {
        self.hides += 1;
        log::info!("hide track {track_id}: {identity}");
    }
}
