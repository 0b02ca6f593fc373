pub mod distance_matcher;
pub mod json_roster_store;
