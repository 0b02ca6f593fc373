use std::collections::HashMap;
use std::time::Instant;

use crate::shared::bounds::Bounds;
use crate::shared::encoding::FaceEncoding;
use crate::shared::ids::{ContactId, TrackId};

/// Lifecycle of a visible track. Unseen and hidden tracks are simply absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    VisibleUnknown,
    VisibleKnown,
    Interviewing,
}

/// Per-sighting state for one visible face.
#[derive(Clone, Debug)]
pub struct FaceTrack {
    pub track_id: TrackId,
    /// Bounds from the most recent Show/Move, never smoothed.
    pub bounds: Bounds,
    pub resolved_contact_id: Option<ContactId>,
    /// Captured at Show time for enrollment.
    pub encoding: Option<FaceEncoding>,
    pub state: TrackState,
    pub created_tick: u64,
    pub last_update_tick: u64,
    pub shown_at: Instant,
    /// Arrival order across all tracks, for first-seen-wins decisions.
    pub arrival: u64,
    /// Cleared once this sighting has been interviewed or has given up waiting.
    pub interview_eligible: bool,
}

impl FaceTrack {
    pub fn is_waiting_for_interview(&self) -> bool {
        self.state == TrackState::VisibleUnknown && self.interview_eligible
    }

    pub fn resolve(&mut self, contact_id: ContactId) {
        self.resolved_contact_id = Some(contact_id);
        self.state = TrackState::VisibleKnown;
    }
}

/// Live tracks keyed by track id. Owned by the dispatcher alone.
#[derive(Default)]
pub struct TrackTable {
    tracks: HashMap<TrackId, FaceTrack>,
    next_arrival: u64,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a track for a first Show. Returns `false` if the id is live.
    pub fn create(
        &mut self,
        track_id: TrackId,
        bounds: Bounds,
        encoding: Option<FaceEncoding>,
        resolved_contact_id: Option<ContactId>,
        tick: u64,
        now: Instant,
    ) -> bool {
        if self.tracks.contains_key(&track_id) {
            return false;
        }
        let state = if resolved_contact_id.is_some() {
            TrackState::VisibleKnown
        } else {
            TrackState::VisibleUnknown
        };
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.tracks.insert(
            track_id,
            FaceTrack {
                track_id,
                bounds,
                resolved_contact_id,
                encoding,
                state,
                created_tick: tick,
                last_update_tick: tick,
                shown_at: now,
                arrival,
                interview_eligible: true,
            },
        );
        true
    }

    /// Replaces the bounds of a live track. Returns `None` for unknown ids.
    pub fn update_bounds(&mut self, track_id: TrackId, bounds: Bounds, tick: u64) -> Option<&mut FaceTrack> {
        let track = self.tracks.get_mut(&track_id)?;
        track.bounds = bounds;
        track.last_update_tick = tick;
        Some(track)
    }

    pub fn get(&self, track_id: TrackId) -> Option<&FaceTrack> {
        self.tracks.get(&track_id)
    }

    pub fn get_mut(&mut self, track_id: TrackId) -> Option<&mut FaceTrack> {
        self.tracks.get_mut(&track_id)
    }

    pub fn remove(&mut self, track_id: TrackId) -> Option<FaceTrack> {
        self.tracks.remove(&track_id)
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.tracks.contains_key(&track_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaceTrack> {
        self.tracks.values()
    }

    /// Tracks still hoping for an interview, earliest arrival first.
    pub fn waiting_for_interview(&self) -> Vec<TrackId> {
        let mut waiting: Vec<&FaceTrack> = self
            .tracks
            .values()
            .filter(|t| t.is_waiting_for_interview())
            .collect();
        waiting.sort_by_key(|t| t.arrival);
        waiting.into_iter().map(|t| t.track_id).collect()
    }
}
