use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use crate::shared::config::RobotConfig;
use crate::shared::frame::Frame;
use crate::vision::domain::face_detector::FaceDetector;
use crate::vision::domain::recognition_engine::RecognitionEngine;
use crate::vision::domain::sighting_event::SightingEvent;

use super::event_queue::{event_queue, EventQueue, EventSender};
use super::face_tracker::FaceTracker;
use super::frame_gate::FrameGate;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recognition worker is already running")]
    AlreadyRunning,
    #[error("recognition worker is not running")]
    NotRunning,
    #[error("recognition worker panicked")]
    WorkerPanicked,
}

/// Recognition engine with a dedicated worker thread.
///
/// Layout: `capture → FrameGate → worker [detect → track] → EventQueue → poll`
///
/// The worker only ever touches the two handoff points; all callback logic
/// runs on whichever thread calls [`RecognitionEngine::poll`].
pub struct ThreadedRecognitionEngine {
    gate: Arc<FrameGate>,
    sender: EventSender,
    queue: EventQueue,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<Box<dyn FaceDetector>>>,
    frame_wait: Duration,
    tracker_max_lost: usize,
    tracker_iou_threshold: f64,
}

impl ThreadedRecognitionEngine {
    pub fn new(config: &RobotConfig) -> Self {
        let (sender, queue) = event_queue();
        Self {
            gate: Arc::new(FrameGate::new()),
            sender,
            queue,
            cancelled: Arc::new(AtomicBool::new(false)),
            worker: None,
            frame_wait: config.frame_wait(),
            tracker_max_lost: config.tracker_max_lost,
            tracker_iou_threshold: config.tracker_iou_threshold,
        }
    }

    /// Shared handle for capture sources running on their own thread.
    pub fn frame_gate(&self) -> Arc<FrameGate> {
        self.gate.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn start(&mut self, detector: Box<dyn FaceDetector>) -> Result<(), EngineError> {
        if self.worker.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        self.cancelled.store(false, Ordering::Relaxed);
        let tracker = FaceTracker::new(self.tracker_max_lost, self.tracker_iou_threshold);
        self.worker = Some(spawn_worker(
            detector,
            tracker,
            self.gate.clone(),
            self.sender.clone(),
            self.cancelled.clone(),
            self.frame_wait,
        ));
        log::info!("Recognition worker started");
        Ok(())
    }

    /// Raises the kill switch, joins the worker and hands the detector back.
    ///
    /// Faces still visible at shutdown are reported hidden, so the next
    /// `poll` closes every open track.
    pub fn stop(&mut self) -> Result<Box<dyn FaceDetector>, EngineError> {
        let handle = self.worker.take().ok_or(EngineError::NotRunning)?;
        self.cancelled.store(true, Ordering::Relaxed);
        let detector = handle.join().map_err(|_| EngineError::WorkerPanicked)?;
        log::info!("Recognition worker stopped");
        Ok(detector)
    }
}

impl RecognitionEngine for ThreadedRecognitionEngine {
    fn submit_frame(&self, frame: Frame) {
        self.gate.submit(frame);
    }

    fn poll(&mut self) -> Vec<SightingEvent> {
        self.queue.drain_all()
    }
}

impl Drop for ThreadedRecognitionEngine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                log::warn!("Failed to stop recognition worker: {e}");
            }
        }
    }
}

fn spawn_worker(
    mut detector: Box<dyn FaceDetector>,
    mut tracker: FaceTracker,
    gate: Arc<FrameGate>,
    sender: EventSender,
    cancelled: Arc<AtomicBool>,
    frame_wait: Duration,
) -> JoinHandle<Box<dyn FaceDetector>> {
    std::thread::spawn(move || {
        while !cancelled.load(Ordering::Relaxed) {
            let Some(frame) = gate.wait(frame_wait) else {
                continue;
            };

            let detections = match detector.detect(&frame) {
                Ok(detections) => detections,
                Err(e) => {
                    log::warn!("Face detection failed on frame {}: {e}", frame.index());
                    continue;
                }
            };

            for event in tracker.update(detections) {
                if !sender.send(event) {
                    return detector;
                }
            }
        }

        for event in tracker.retire_all() {
            sender.send(event);
        }
        detector
    })
}
