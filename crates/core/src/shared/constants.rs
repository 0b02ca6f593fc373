/// Dimensionality of encodings produced by the native embedder.
pub const ENCODING_DIMENSIONS: usize = 128;

/// Euclidean distance within which an encoding matches an enrolled contact.
/// Compared against squared distances as `0.6 * 0.6`.
pub const DEFAULT_MATCH_TOLERANCE: f64 = 0.6;

/// Frames a track may go undetected before the engine reports it hidden.
pub const TRACKER_MAX_LOST: usize = 3;

/// Minimum IoU for associating a detection with an existing track.
pub const TRACKER_IOU_THRESHOLD: f64 = 0.3;

/// How long the engine worker waits for a frame before re-checking its kill switch.
pub const FRAME_WAIT_MS: u64 = 100;

/// Control loop sleep between ticks.
pub const TICK_INTERVAL_MS: u64 = 10;

pub const MAX_LISTEN_MS: u64 = 10_000;
pub const MAX_INTERVIEW_WAIT_MS: u64 = 30_000;

pub const PROMPT_TEXT: &str = "Who are you?";
pub const GREETING_TEMPLATE: &str = "Hello, {name}!";
pub const FAREWELL_TEMPLATE: &str = "Goodbye, {name}!";

pub const CONFIG_DIR_NAME: &str = "FaceFriend";
pub const CONFIG_FILE_NAME: &str = "settings.json";
pub const ROSTER_FILE_NAME: &str = "contacts.json";
