pub mod contact;
pub mod encoding_matcher;
pub mod identity_registry;
