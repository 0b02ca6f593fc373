use std::time::{Duration, Instant};

use crate::shared::ids::TrackId;
use crate::speech::domain::speech_port::{ListenHandle, ListenPoll, SpeechError, SpeechPort};
use crate::speech::domain::utterance::name_from_utterance;

/// Interview progress. Only `Prompting` and `Listening` are live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterviewState {
    Prompting,
    Listening,
    NamingSuccess,
    NamingTimeout,
    Abandoned,
}

impl InterviewState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, InterviewState::Prompting | InterviewState::Listening)
    }
}

/// What one call to [`InterviewSession::advance`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewStep {
    /// Still prompting or listening.
    InProgress,
    /// The visitor gave a usable name.
    Named(String),
    /// No name was captured; the face stays unknown.
    Failed(InterviewFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewFailure {
    Speech(SpeechError),
    ListenTimeout(Duration),
}

impl std::fmt::Display for InterviewFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterviewFailure::Speech(e) => write!(f, "{e}"),
            InterviewFailure::ListenTimeout(d) => {
                write!(f, "no answer within {} ms", d.as_millis())
            }
        }
    }
}

/// The "who are you?" exchange with one unresolved face.
///
/// The dispatcher holds at most one of these, because the speaker and
/// microphone belong to a single conversation at a time.
pub struct InterviewSession {
    subject: TrackId,
    state: InterviewState,
    started_at: Instant,
    listening_since: Option<Instant>,
    listen: Option<ListenHandle>,
}

impl InterviewSession {
    pub fn new(subject: TrackId, started_at: Instant) -> Self {
        Self {
            subject,
            state: InterviewState::Prompting,
            started_at,
            listening_since: None,
            listen: None,
        }
    }

    pub fn subject(&self) -> TrackId {
        self.subject
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn is_listening(&self) -> bool {
        self.state == InterviewState::Listening
    }

    /// Runs the next step of the exchange.
    ///
    /// In `Prompting` this speaks the prompt (the one blocking step) and
    /// opens the microphone; in `Listening` it only checks for an answer.
    pub fn advance(
        &mut self,
        speech: &mut dyn SpeechPort,
        prompt: &str,
        max_listen: Option<Duration>,
        now: Instant,
    ) -> InterviewStep {
        match self.state {
            InterviewState::Prompting => self.prompt(speech, prompt, now),
            InterviewState::Listening => self.check_answer(max_listen, now),
            _ => InterviewStep::InProgress,
        }
    }

    /// Ends the session because its subject left. Any answer still in
    /// flight is discarded.
    pub fn abandon(&mut self) {
        self.listen = None;
        self.state = InterviewState::Abandoned;
    }

    fn prompt(&mut self, speech: &mut dyn SpeechPort, prompt: &str, now: Instant) -> InterviewStep {
        if let Err(e) = speech.speak(prompt) {
            return self.fail(InterviewFailure::Speech(e));
        }
        match speech.start_listening() {
            Ok(handle) => {
                self.listen = Some(handle);
                self.listening_since = Some(now);
                self.state = InterviewState::Listening;
                InterviewStep::InProgress
            }
            Err(e) => self.fail(InterviewFailure::Speech(e)),
        }
    }

    fn check_answer(&mut self, max_listen: Option<Duration>, now: Instant) -> InterviewStep {
        let poll = match &self.listen {
            Some(handle) => handle.poll(),
            None => ListenPoll::Failed(SpeechError::Disconnected),
        };
        match poll {
            ListenPoll::Heard(text) => match name_from_utterance(&text) {
                Some(name) => {
                    self.listen = None;
                    self.state = InterviewState::NamingSuccess;
                    InterviewStep::Named(name)
                }
                None => self.fail(InterviewFailure::Speech(SpeechError::Unintelligible)),
            },
            ListenPoll::Failed(e) => self.fail(InterviewFailure::Speech(e)),
            ListenPoll::Pending => {
                let since = self.listening_since.unwrap_or(self.started_at);
                match max_listen {
                    Some(limit) if now.saturating_duration_since(since) >= limit => {
                        self.fail(InterviewFailure::ListenTimeout(limit))
                    }
                    _ => InterviewStep::InProgress,
                }
            }
        }
    }

    fn fail(&mut self, failure: InterviewFailure) -> InterviewStep {
        self.listen = None;
        self.state = InterviewState::NamingTimeout;
        InterviewStep::Failed(failure)
    }
}
