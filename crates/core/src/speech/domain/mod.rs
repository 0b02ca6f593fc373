pub mod speech_port;
pub mod utterance;
