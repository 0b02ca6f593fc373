use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crate::identity::domain::identity_registry::IdentityRegistry;
use crate::shared::config::RobotConfig;
use crate::shared::frame::Frame;
use crate::speech::domain::speech_port::SpeechPort;
use crate::vision::domain::recognition_engine::RecognitionEngine;

use super::domain::event_dispatcher::{DispatchContext, EventDispatcher, TickReport};
use super::domain::face_observer::FaceObserver;

/// Totals accumulated by [`ControlLoop::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub events: usize,
    pub violations: usize,
    pub interviews: usize,
}

impl RunStats {
    fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.events += report.applied;
        self.violations += report.violations.len();
        self.interviews += report.interviews_finished.len();
    }
}

/// Single-threaded cooperative driver for one robot.
///
/// Owns the registry, speech and observer outright and lends them to the
/// dispatcher each tick. The recognition engine is the only part with
/// threads of its own.
pub struct ControlLoop {
    engine: Box<dyn RecognitionEngine>,
    dispatcher: EventDispatcher,
    registry: IdentityRegistry,
    speech: Box<dyn SpeechPort>,
    observer: Box<dyn FaceObserver>,
    tick_interval: Duration,
}

impl ControlLoop {
    pub fn new(
        config: &RobotConfig,
        engine: Box<dyn RecognitionEngine>,
        registry: IdentityRegistry,
        speech: Box<dyn SpeechPort>,
        observer: Box<dyn FaceObserver>,
    ) -> Self {
        Self {
            engine,
            dispatcher: EventDispatcher::new(config),
            registry,
            speech,
            observer,
            tick_interval: config.tick_interval(),
        }
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Forwards a frame to the engine without blocking.
    pub fn submit_frame(&self, frame: Frame) {
        self.engine.submit_frame(frame);
    }

    /// Drains the engine and applies the batch.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let events = self.engine.poll();
        let mut ctx = DispatchContext {
            registry: &mut self.registry,
            speech: self.speech.as_mut(),
            observer: self.observer.as_mut(),
            now,
            wall_clock: SystemTime::now(),
        };
        self.dispatcher.tick(events, &mut ctx)
    }

    /// Ticks until `cancelled` is raised or `max_ticks` have run, sleeping
    /// one tick interval between ticks.
    pub fn run(&mut self, cancelled: &AtomicBool, max_ticks: Option<u64>) -> RunStats {
        let mut stats = RunStats::default();
        log::info!("Control loop running, tick every {:?}", self.tick_interval);
        while !cancelled.load(Ordering::Relaxed) {
            if max_ticks.is_some_and(|max| stats.ticks >= max) {
                break;
            }
            let report = self.tick(Instant::now());
            stats.record(&report);
            thread::sleep(self.tick_interval);
        }
        log::info!(
            "Control loop stopped after {} ticks ({} events, {} dropped, {} interviews)",
            stats.ticks,
            stats.events,
            stats.violations,
            stats.interviews
        );
        stats
    }

    /// Hands the registry back so the caller can persist it.
    pub fn into_registry(self) -> IdentityRegistry {
        self.registry
    }
}
