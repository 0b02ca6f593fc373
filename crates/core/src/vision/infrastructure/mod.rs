pub mod event_queue;
pub mod face_tracker;
pub mod frame_gate;
pub mod replay_face_detector;
pub mod threaded_recognition_engine;
