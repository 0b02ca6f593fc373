use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("audio capture failed: {0}")]
    Capture(String),
    #[error("no usable text in utterance")]
    Unintelligible,
    #[error("speech recognizer went away before answering")]
    Disconnected,
}

/// The robot's exclusive speech and audio resource.
pub trait SpeechPort {
    /// Speaks `text`, returning once it has been said.
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;

    /// Opens the audio capture scope and starts speech-to-text in the
    /// background. The outcome is collected through the returned handle.
    fn start_listening(&mut self) -> Result<ListenHandle, SpeechError>;
}

/// Result of checking on an in-flight listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenPoll {
    Pending,
    Heard(String),
    Failed(SpeechError),
}

/// Receiving end of one listen request.
///
/// Dropping the handle abandons the request; whatever the recognizer
/// produces afterwards is discarded.
pub struct ListenHandle {
    rx: Receiver<Result<String, SpeechError>>,
}

impl ListenHandle {
    /// Creates a handle plus the sender the recognizer completes it with.
    pub fn channel() -> (Sender<Result<String, SpeechError>>, ListenHandle) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (tx, ListenHandle { rx })
    }

    /// Wraps a receiver shared with a long-lived recognizer.
    pub fn from_receiver(rx: Receiver<Result<String, SpeechError>>) -> ListenHandle {
        ListenHandle { rx }
    }

    /// Non-blocking check for the utterance.
    pub fn poll(&self) -> ListenPoll {
        match self.rx.try_recv() {
            Ok(Ok(text)) => ListenPoll::Heard(text),
            Ok(Err(e)) => ListenPoll::Failed(e),
            Err(TryRecvError::Empty) => ListenPoll::Pending,
            Err(TryRecvError::Disconnected) => ListenPoll::Failed(SpeechError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_answered() {
        let (tx, handle) = ListenHandle::channel();
        assert_eq!(handle.poll(), ListenPoll::Pending);
        tx.send(Ok("Sam".to_string())).unwrap();
        assert_eq!(handle.poll(), ListenPoll::Heard("Sam".to_string()));
    }

    #[test]
    fn test_recognizer_error_is_reported() {
        let (tx, handle) = ListenHandle::channel();
        tx.send(Err(SpeechError::Unintelligible)).unwrap();
        assert_eq!(handle.poll(), ListenPoll::Failed(SpeechError::Unintelligible));
    }

    #[test]
    fn test_dropped_sender_is_disconnected() {
        let (tx, handle) = ListenHandle::channel();
        drop(tx);
        assert_eq!(handle.poll(), ListenPoll::Failed(SpeechError::Disconnected));
    }

    #[test]
    fn test_shared_receiver_handle() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = ListenHandle::from_receiver(rx.clone());
        tx.send(Ok("Kim".to_string())).unwrap();
        assert_eq!(handle.poll(), ListenPoll::Heard("Kim".to_string()));
        drop(handle);
        tx.send(Ok("Lee".to_string())).unwrap();
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_abandoned_handle_discards_answer() {
        let (tx, handle) = ListenHandle::channel();
        drop(handle);
        assert!(tx.send(Ok("late".to_string())).is_err());
    }
}
