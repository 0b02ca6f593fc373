pub mod bounds;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod frame;
pub mod ids;
