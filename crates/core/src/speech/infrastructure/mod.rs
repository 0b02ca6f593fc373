pub mod console_speech;
pub mod scripted_speech;
