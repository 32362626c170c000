pub mod conversation;
pub mod indicators;
