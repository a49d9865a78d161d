//! recap - A Slack bot that summarizes the last hours of a channel using `OpenAI`.
//!
//! When someone posts the trigger token (`!summarize` by default) in a channel,
//! the bot:
//! 1. posts a placeholder status message,
//! 2. collects the channel history inside the lookback window into a
//!    normalized, size-bounded transcript,
//! 3. asks a chat-completion model for a summary,
//! 4. edits the placeholder with the summary (or a notice explaining why
//!    there is none).
//!
//! # Architecture
//!
//! The system uses:
//! - slack-morphism Socket Mode for the inbound event stream
//! - the Slack Web API (slack-morphism + reqwest) for history and message edits
//! - the `OpenAI` chat-completions endpoint for summaries
//! - Tokio for async runtime
//!
//! The pipeline only sees the [`core::platform::ChatPlatform`] and
//! [`core::platform::SummaryProvider`] traits, so both ends can be replaced.
//!
//! # Example
//!
//! ```no_run
//! use recap::core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     recap::setup_logging();
//!     let config = AppConfig::from_env()?;
//!     recap::slack::run(config).await
//! }
//! ```

// Module declarations
pub mod ai;
pub mod bot;
pub mod collect;
pub mod core;
pub mod errors;
pub mod prompt;
pub mod response;
pub mod slack;
pub mod utils;

pub use ai::estimate_tokens;
pub use bot::{HandleOutcome, SummaryBot};
pub use errors::RecapError;

/// Configure structured logging with JSON format.
///
/// Verbosity follows `RUST_LOG` and defaults to `info`.
///
/// # Example
///
/// ```
/// recap::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
