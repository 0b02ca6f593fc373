pub mod identity;
pub mod interaction;
pub mod shared;
pub mod speech;
pub mod vision;
