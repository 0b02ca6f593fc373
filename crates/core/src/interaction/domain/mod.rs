pub mod event_dispatcher;
pub mod face_observer;
pub mod interview_session;
pub mod track_table;
