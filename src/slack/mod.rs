//! All Slack-specific functionality

pub mod client;
pub mod listener;

// Re-export main types for convenience
pub use client::SlackClient;
pub use listener::{incoming_from_event, run};
