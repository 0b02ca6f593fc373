use crate::shared::frame::Frame;

use super::sighting_event::SightingEvent;

/// The control loop's view of a recognition engine.
///
/// `submit_frame` must never block the caller. `poll` hands over every event
/// produced since the previous poll, in production order, on the calling thread.
pub trait RecognitionEngine {
    fn submit_frame(&self, frame: Frame);

    fn poll(&mut self) -> Vec<SightingEvent>;
}
