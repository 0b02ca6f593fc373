//! Engine-side face track assignment.
//!
//! Detections are associated with live tracks by greedy IoU matching; a
//! track that goes unmatched for more than `max_lost` consecutive frames is
//! retired. Each update is translated into the Show/Move/Hide events the
//! control loop consumes.

use std::collections::HashSet;

use crate::shared::bounds::Bounds;
use crate::shared::ids::TrackId;
use crate::vision::domain::face_detector::Detection;
use crate::vision::domain::sighting_event::SightingEvent;

#[derive(Clone, Debug)]
struct TrackState {
    id: TrackId,
    bounds: Bounds,
    frames_lost: usize,
    matched: bool,
}

pub struct FaceTracker {
    tracks: Vec<TrackState>,
    max_lost: usize,
    iou_threshold: f64,
}

impl FaceTracker {
    pub fn new(max_lost: usize, iou_threshold: f64) -> Self {
        Self {
            tracks: Vec::new(),
            max_lost,
            iou_threshold,
        }
    }

    /// Folds one frame's detections into the track set.
    ///
    /// Events come out as moves, then hides, then shows, so an id retired
    /// in this frame can be reused by a new face without the Show arriving
    /// ahead of the old track's Hide.
    pub fn update(&mut self, detections: Vec<Detection>) -> Vec<SightingEvent> {
        let mut events = Vec::new();

        self.reset_match_flags();
        let matched_dets = self.match_existing(&detections, &mut events);
        self.age_unmatched_tracks(&mut events);
        self.create_new_tracks(detections, &matched_dets, &mut events);

        events
    }

    /// Hides every live track, e.g. when the engine shuts down.
    pub fn retire_all(&mut self) -> Vec<SightingEvent> {
        self.tracks
            .drain(..)
            .map(|t| SightingEvent::Hide { track_id: t.id })
            .collect()
    }

    pub fn live_tracks(&self) -> Vec<(TrackId, Bounds)> {
        self.tracks.iter().map(|t| (t.id, t.bounds)).collect()
    }

    fn reset_match_flags(&mut self) {
        for track in &mut self.tracks {
            track.matched = false;
        }
    }

    fn match_existing(
        &mut self,
        detections: &[Detection],
        events: &mut Vec<SightingEvent>,
    ) -> HashSet<usize> {
        let mut matched_dets = HashSet::new();
        for (ti, di) in greedy_match(&self.tracks, detections, self.iou_threshold) {
            let track = &mut self.tracks[ti];
            track.bounds = detections[di].bounds;
            track.frames_lost = 0;
            track.matched = true;
            matched_dets.insert(di);
            events.push(SightingEvent::Move {
                track_id: track.id,
                bounds: track.bounds,
            });
        }
        matched_dets
    }

    fn age_unmatched_tracks(&mut self, events: &mut Vec<SightingEvent>) {
        for track in &mut self.tracks {
            if !track.matched {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| {
            let keep = t.frames_lost <= max_lost;
            if !keep {
                events.push(SightingEvent::Hide { track_id: t.id });
            }
            keep
        });
    }

    fn create_new_tracks(
        &mut self,
        detections: Vec<Detection>,
        matched: &HashSet<usize>,
        events: &mut Vec<SightingEvent>,
    ) {
        for (di, det) in detections.into_iter().enumerate() {
            if matched.contains(&di) {
                continue;
            }
            let id = self.lowest_free_id();
            self.tracks.push(TrackState {
                id,
                bounds: det.bounds,
                frames_lost: 0,
                matched: true,
            });
            events.push(SightingEvent::Show {
                track_id: id,
                bounds: det.bounds,
                encoding: det.encoding,
                contact_id: None,
            });
        }
    }

    fn lowest_free_id(&self) -> TrackId {
        let live: HashSet<u32> = self.tracks.iter().map(|t| t.id.0).collect();
        let mut candidate = 1;
        while live.contains(&candidate) {
            candidate += 1;
        }
        TrackId(candidate)
    }
}

/// Greedy IoU matching: pairs sorted by descending IoU, each track and
/// detection used at most once.
fn greedy_match(
    tracks: &[TrackState],
    detections: &[Detection],
    thresh: f64,
) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (ti, track) in tracks.iter().enumerate() {
        for (di, det) in detections.iter().enumerate() {
            let score = track.bounds.iou(&det.bounds);
            if score >= thresh && score > 0.0 {
                pairs.push((ti, di, score));
            }
        }
    }
    pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut used_tracks = HashSet::new();
    let mut used_dets = HashSet::new();
    let mut matches = Vec::new();

    for (ti, di, _) in pairs {
        if !used_tracks.contains(&ti) && !used_dets.contains(&di) {
            used_tracks.insert(ti);
            used_dets.insert(di);
            matches.push((ti, di));
        }
    }
    matches
}
