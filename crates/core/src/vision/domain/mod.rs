pub mod face_detector;
pub mod recognition_engine;
pub mod sighting_event;
