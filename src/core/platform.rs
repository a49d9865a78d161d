//! Seams between the summarization pipeline and the outside world.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{BotIdentity, ChatMessage};
use crate::errors::RecapError;

/// Chat platform capabilities the pipeline relies on.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Every message posted after `after`, oldest first, with no count limit.
    async fn history_after(
        &self,
        channel_id: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, RecapError>;

    /// Posts a message and returns a handle that `update_message` accepts.
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<String, RecapError>;

    async fn update_message(
        &self,
        channel_id: &str,
        message_ref: &str,
        text: &str,
    ) -> Result<(), RecapError>;

    /// Human-readable name of the space a channel belongs to, if any.
    async fn context_label(&self, channel_id: &str) -> Result<Option<String>, RecapError>;

    async fn bot_identity(&self) -> Result<BotIdentity, RecapError>;
}

/// A language model that turns a transcript into a summary.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(&self, transcript: &str, context_label: &str)
    -> Result<String, RecapError>;
}
