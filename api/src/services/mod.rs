//! Per-resource request builders on [`crate::client::FundApi`]. No
//! cross-resource orchestration happens here; bodies are unwrapped through
//! [`crate::envelope`] and handed back as-is or lightly typed.

pub mod auth;
pub mod dashboard;
pub mod payments;
pub mod scores;
pub mod tickets;
pub mod tournaments;
pub mod users;
