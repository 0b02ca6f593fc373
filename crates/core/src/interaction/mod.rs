pub mod control_loop;
pub mod domain;
pub mod logging_face_observer;
