use std::time::{Duration, Instant, SystemTime};

use thiserror::Error;

use crate::identity::domain::identity_registry::IdentityRegistry;
use crate::shared::bounds::Bounds;
use crate::shared::config::RobotConfig;
use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::{ContactId, TrackId};
use crate::speech::domain::speech_port::SpeechPort;
use crate::vision::domain::sighting_event::SightingEvent;

use super::face_observer::{FaceObserver, Identity};
use super::interview_session::{InterviewSession, InterviewState, InterviewStep};
use super::track_table::{FaceTrack, TrackState, TrackTable};

/// An event that breaks the per-track Show, Move, Hide ordering.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("{kind} for unknown track {track_id}")]
    UnknownTrack {
        kind: &'static str,
        track_id: TrackId,
    },
}

/// Collaborators threaded into every dispatch call by the control loop.
pub struct DispatchContext<'a> {
    pub registry: &'a mut IdentityRegistry,
    pub speech: &'a mut dyn SpeechPort,
    pub observer: &'a mut dyn FaceObserver,
    /// Monotonic clock for interview timeouts.
    pub now: Instant,
    /// Recorded on contacts as first/last seen.
    pub wall_clock: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewOutcome {
    pub subject: TrackId,
    pub state: InterviewState,
    pub contact_id: Option<ContactId>,
}

/// What one tick did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub applied: usize,
    pub violations: Vec<ProtocolViolation>,
    pub interviews_started: Vec<TrackId>,
    pub interviews_finished: Vec<InterviewOutcome>,
}

/// Applies sighting events to the track table and drives the interview.
///
/// Owns the track table and the single interview slot. Each tick applies
/// the whole batch in order, then lets the interview take one step. The
/// only speech calls that block are the prompt and greetings, and they run
/// after the batch, never in the middle of it.
pub struct EventDispatcher {
    tracks: TrackTable,
    session: Option<InterviewSession>,
    config: RobotConfig,
    tick: u64,
}

impl EventDispatcher {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            tracks: TrackTable::new(),
            session: None,
            config: config.clone(),
            tick: 0,
        }
    }

    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    pub fn active_session(&self) -> Option<&InterviewSession> {
        self.session.as_ref()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn tick(&mut self, events: Vec<SightingEvent>, ctx: &mut DispatchContext<'_>) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        let mut announcements = Vec::new();

        for event in events {
            match self.apply(event, ctx, &mut announcements, &mut report) {
                Ok(()) => report.applied += 1,
                Err(violation) => {
                    log::warn!("Dropping event: {violation}");
                    report.violations.push(violation);
                }
            }
        }

        self.expire_waiting(ctx.now);
        if self.session.is_none() {
            if let Some(&next) = self.tracks.waiting_for_interview().first() {
                self.try_start_interview(next, ctx.now, &mut report);
            }
        }

        self.announce(ctx.speech, announcements);
        self.advance_session(ctx, &mut report);

        log::trace!(
            "Tick {}: {} applied, {} dropped, {} live tracks",
            report.tick,
            report.applied,
            report.violations.len(),
            self.tracks.len()
        );
        report
    }

    fn apply(
        &mut self,
        event: SightingEvent,
        ctx: &mut DispatchContext<'_>,
        announcements: &mut Vec<String>,
        report: &mut TickReport,
    ) -> Result<(), ProtocolViolation> {
        match event {
            SightingEvent::Show {
                track_id,
                bounds,
                encoding,
                contact_id,
            } => {
                if self.tracks.contains(track_id) {
                    self.reannounce(track_id, bounds, encoding, contact_id, ctx, announcements, report);
                } else {
                    self.show(track_id, bounds, encoding, contact_id, ctx, announcements, report);
                }
                Ok(())
            }
            SightingEvent::Move { track_id, bounds } => self.move_track(track_id, bounds, ctx, report),
            SightingEvent::Hide { track_id } => self.hide(track_id, ctx, announcements, report),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn show(
        &mut self,
        track_id: TrackId,
        bounds: Bounds,
        encoding: Option<FaceEncoding>,
        contact_id: Option<ContactId>,
        ctx: &mut DispatchContext<'_>,
        announcements: &mut Vec<String>,
        report: &mut TickReport,
    ) {
        let resolved = resolve(ctx.registry, contact_id, encoding.as_ref());
        self.tracks
            .create(track_id, bounds, encoding, resolved, self.tick, ctx.now);
        if let Some(id) = resolved {
            touch(ctx.registry, id, ctx.wall_clock);
        }

        let identity = identity_of(ctx.registry, resolved);
        log::debug!("Track {track_id} shown at {bounds} as {identity}");
        ctx.observer.on_show(track_id, bounds, &identity);

        match identity.name() {
            Some(name) => {
                if self.config.greet_known {
                    announcements.push(self.config.greeting_for(name));
                }
            }
            None => self.try_start_interview(track_id, ctx.now, report),
        }
    }

    /// A second Show without a Hide in between: keep the track, take the
    /// new bounds, and give an unresolved face another registry lookup.
    #[allow(clippy::too_many_arguments)]
    fn reannounce(
        &mut self,
        track_id: TrackId,
        bounds: Bounds,
        encoding: Option<FaceEncoding>,
        contact_id: Option<ContactId>,
        ctx: &mut DispatchContext<'_>,
        announcements: &mut Vec<String>,
        report: &mut TickReport,
    ) {
        let tick = self.tick;
        let Some(track) = self.tracks.update_bounds(track_id, bounds, tick) else {
            return;
        };
        log::debug!("Track {track_id} re-announced, treating as move");

        let mut newly_resolved = false;
        if track.resolved_contact_id.is_none() && track.state != TrackState::Interviewing {
            if let Some(id) = resolve(ctx.registry, contact_id, encoding.as_ref()) {
                track.resolve(id);
                newly_resolved = true;
            }
            if encoding.is_some() {
                track.encoding = encoding;
            }
        }
        let resolved = track.resolved_contact_id;

        if let Some(id) = resolved {
            touch(ctx.registry, id, ctx.wall_clock);
        }
        let identity = identity_of(ctx.registry, resolved);
        ctx.observer.on_move(track_id, bounds, &identity);

        match identity.name() {
            Some(name) if newly_resolved && self.config.greet_known => {
                announcements.push(self.config.greeting_for(name));
            }
            Some(_) => {}
            None => self.try_start_interview(track_id, ctx.now, report),
        }
    }

    fn move_track(
        &mut self,
        track_id: TrackId,
        bounds: Bounds,
        ctx: &mut DispatchContext<'_>,
        report: &mut TickReport,
    ) -> Result<(), ProtocolViolation> {
        let tick = self.tick;
        let track = self
            .tracks
            .update_bounds(track_id, bounds, tick)
            .ok_or(ProtocolViolation::UnknownTrack {
                kind: "move",
                track_id,
            })?;
        let resolved = track.resolved_contact_id;

        if let Some(id) = resolved {
            touch(ctx.registry, id, ctx.wall_clock);
        }
        let identity = identity_of(ctx.registry, resolved);
        ctx.observer.on_move(track_id, bounds, &identity);

        if resolved.is_none() {
            self.try_start_interview(track_id, ctx.now, report);
        }
        Ok(())
    }

    fn hide(
        &mut self,
        track_id: TrackId,
        ctx: &mut DispatchContext<'_>,
        announcements: &mut Vec<String>,
        report: &mut TickReport,
    ) -> Result<(), ProtocolViolation> {
        let track = self
            .tracks
            .remove(track_id)
            .ok_or(ProtocolViolation::UnknownTrack {
                kind: "hide",
                track_id,
            })?;

        let identity = identity_of(ctx.registry, track.resolved_contact_id);
        log::debug!("Track {track_id} hidden ({identity})");
        ctx.observer.on_hide(track_id, &identity);

        let interviewing = self
            .session
            .as_ref()
            .is_some_and(|s| s.subject() == track_id);
        if interviewing {
            if let Some(mut session) = self.session.take() {
                session.abandon();
                log::info!("Track {track_id} left mid-interview, interview abandoned");
                report.interviews_finished.push(InterviewOutcome {
                    subject: track_id,
                    state: session.state(),
                    contact_id: None,
                });
            }
        }

        if let Some(name) = identity.name() {
            if self.config.farewell_known {
                announcements.push(self.config.farewell_for(name));
            }
        }
        Ok(())
    }

    fn try_start_interview(&mut self, track_id: TrackId, now: Instant, report: &mut TickReport) {
        if self.session.is_some() {
            return;
        }
        let limit = self.config.max_interview_wait();
        let Some(track) = self.tracks.get_mut(track_id) else {
            return;
        };
        if !track.is_waiting_for_interview() || give_up_if_stale(track, limit, now) {
            return;
        }
        track.state = TrackState::Interviewing;
        track.interview_eligible = false;
        self.session = Some(InterviewSession::new(track_id, now));
        report.interviews_started.push(track_id);
        log::info!("Starting interview with track {track_id}");
    }

    fn expire_waiting(&mut self, now: Instant) {
        let limit = self.config.max_interview_wait();
        if limit.is_none() {
            return;
        }
        for track_id in self.tracks.waiting_for_interview() {
            if let Some(track) = self.tracks.get_mut(track_id) {
                give_up_if_stale(track, limit, now);
            }
        }
    }

    fn announce(&self, speech: &mut dyn SpeechPort, announcements: Vec<String>) {
        if announcements.is_empty() {
            return;
        }
        if self
            .session
            .as_ref()
            .is_some_and(InterviewSession::is_listening)
        {
            log::debug!(
                "Microphone is open, skipping {} announcement(s)",
                announcements.len()
            );
            return;
        }
        for text in &announcements {
            say(speech, text);
        }
    }

    fn advance_session(&mut self, ctx: &mut DispatchContext<'_>, report: &mut TickReport) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let step = session.advance(
            ctx.speech,
            &self.config.prompt_text,
            self.config.max_listen(),
            ctx.now,
        );
        let subject = session.subject();

        match step {
            InterviewStep::InProgress => {}
            InterviewStep::Named(name) => {
                self.session = None;
                let contact_id = self.enroll(subject, &name, ctx);
                let state = if contact_id.is_some() {
                    InterviewState::NamingSuccess
                } else {
                    InterviewState::NamingTimeout
                };
                report.interviews_finished.push(InterviewOutcome {
                    subject,
                    state,
                    contact_id,
                });
            }
            InterviewStep::Failed(failure) => {
                self.session = None;
                log::warn!("Interview with track {subject} failed: {failure}");
                if let Some(track) = self.tracks.get_mut(subject) {
                    track.state = TrackState::VisibleUnknown;
                }
                report.interviews_finished.push(InterviewOutcome {
                    subject,
                    state: InterviewState::NamingTimeout,
                    contact_id: None,
                });
            }
        }
    }

    fn enroll(&mut self, subject: TrackId, name: &str, ctx: &mut DispatchContext<'_>) -> Option<ContactId> {
        let encoding = self.tracks.get(subject).and_then(|t| t.encoding.clone());
        match ctx.registry.provisional_insert(name, encoding) {
            Ok(id) => {
                touch(ctx.registry, id, ctx.wall_clock);
                if let Some(track) = self.tracks.get_mut(subject) {
                    track.resolve(id);
                }
                log::info!("Track {subject} introduced as {name:?} (contact {id})");
                say(ctx.speech, &self.config.greeting_for(name));
                Some(id)
            }
            Err(e) => {
                log::warn!("Could not enroll {name:?}: {e}");
                if let Some(track) = self.tracks.get_mut(subject) {
                    track.state = TrackState::VisibleUnknown;
                }
                None
            }
        }
    }
}

/// Engine-supplied contact id first, then the registry's encoding match.
fn resolve(
    registry: &IdentityRegistry,
    contact_id: Option<ContactId>,
    encoding: Option<&FaceEncoding>,
) -> Option<ContactId> {
    if let Some(id) = contact_id {
        if registry.contains(id) {
            return Some(id);
        }
        log::debug!("Engine reported unknown contact {id}, falling back to encoding");
    }
    encoding.and_then(|e| registry.lookup_by_encoding(e))
}

fn identity_of(registry: &IdentityRegistry, resolved: Option<ContactId>) -> Identity {
    resolved
        .and_then(|id| registry.get(id))
        .map(|c| Identity::Known {
            contact_id: c.contact_id,
            name: c.display_name.clone(),
        })
        .unwrap_or(Identity::Unknown)
}

fn touch(registry: &mut IdentityRegistry, id: ContactId, at: SystemTime) {
    if let Err(e) = registry.touch_seen(id, at) {
        log::warn!("Could not record sighting of contact {id}: {e}");
    }
}

fn say(speech: &mut dyn SpeechPort, text: &str) {
    if let Err(e) = speech.speak(text) {
        log::warn!("Could not say {text:?}: {e}");
    }
}

/// Marks a waiting track as given up once it has waited past `limit`.
fn give_up_if_stale(track: &mut FaceTrack, limit: Option<Duration>, now: Instant) -> bool {
    let Some(limit) = limit else {
        return false;
    };
    if now.saturating_duration_since(track.shown_at) <= limit {
        return false;
    }
    track.interview_eligible = false;
    log::info!(
        "Track {} waited over {} ms for an interview, giving up",
        track.track_id,
        limit.as_millis()
    );
    true
}
