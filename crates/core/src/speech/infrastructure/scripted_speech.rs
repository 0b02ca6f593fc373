use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::speech::domain::speech_port::{ListenHandle, SpeechError, SpeechPort};

/// Speech backend that answers listens from a fixed list.
///
/// Each answer is delivered after `answer_delay` on a helper thread, like a
/// real recognizer finishing in the background. `None` entries simulate an
/// unintelligible utterance; once the list runs out every listen fails.
pub struct ScriptedSpeech {
    answers: VecDeque<Option<String>>,
    answer_delay: Duration,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSpeech {
    pub fn new(answers: impl IntoIterator<Item = Option<String>>, answer_delay: Duration) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            answer_delay,
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared view of everything spoken so far, in order.
    pub fn transcript(&self) -> Arc<Mutex<Vec<String>>> {
        self.spoken.clone()
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

impl SpeechPort for ScriptedSpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        log::info!("robot says: {text}");
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }

    fn start_listening(&mut self) -> Result<ListenHandle, SpeechError> {
        let (tx, handle) = ListenHandle::channel();
        let answer = self.answers.pop_front().flatten();
        let delay = self.answer_delay;
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = tx.send(answer.ok_or(SpeechError::Unintelligible));
        });
        Ok(handle)
    }
}
