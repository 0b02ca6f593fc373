use std::io::{BufRead, BufReader, Write};
use std::thread;

use crossbeam_channel::Receiver;

use crate::speech::domain::speech_port::{ListenHandle, SpeechError, SpeechPort};

/// Terminal stand-in for the robot's speaker and microphone.
///
/// Speech goes to stdout. One reader thread owns the input for the life of
/// the adapter, so the control loop keeps ticking while the visitor types.
/// Lines typed while nobody is listening are dropped at the next listen.
pub struct ConsoleSpeech {
    lines: Receiver<Result<String, SpeechError>>,
}

impl ConsoleSpeech {
    pub fn new() -> Self {
        Self::with_input(BufReader::new(std::io::stdin()))
    }

    pub fn with_input<R: BufRead + Send + 'static>(input: R) -> Self {
        let (tx, lines) = crossbeam_channel::unbounded();
        thread::spawn(move || {
            let mut input = input;
            loop {
                let mut line = String::new();
                let (result, done) = match input.read_line(&mut line) {
                    Ok(0) => (Err(SpeechError::Capture("stdin closed".into())), true),
                    Ok(_) => (Ok(line.trim_end().to_string()), false),
                    Err(e) => (Err(SpeechError::Capture(e.to_string())), true),
                };
                if tx.send(result).is_err() || done {
                    return;
                }
            }
        });
        Self { lines }
    }
}

impl Default for ConsoleSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechPort for ConsoleSpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        log::debug!("Speaking: {text}");
        let mut out = std::io::stdout().lock();
        writeln!(out, "robot: {text}")
            .and_then(|_| out.flush())
            .map_err(|e| SpeechError::Synthesis(e.to_string()))
    }

    fn start_listening(&mut self) -> Result<ListenHandle, SpeechError> {
        let stale = self.lines.try_iter().count();
        if stale > 0 {
            log::debug!("Discarded {stale} line(s) typed before the prompt");
        }
        print!("you: ");
        std::io::stdout()
            .flush()
            .map_err(|e| SpeechError::Capture(e.to_string()))?;
        Ok(ListenHandle::from_receiver(self.lines.clone()))
    }
}
