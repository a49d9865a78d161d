use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message, as reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub user_id: String,
    /// Profile display name. May be empty or junk; see `collect::NameResolver`.
    pub display_name: String,
    /// Immutable account handle.
    pub username: String,
    pub is_bot: bool,
}

/// A single historical message from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: Author,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A configured display-name alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOverride {
    pub source_name: String,
    pub alias: String,
}

/// A message arriving on the live event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub channel_id: String,
    pub user_id: Option<String>,
    pub bot_id: Option<String>,
    pub text: String,
}

/// The bot's own identity on the platform, used to ignore its own messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub bot_id: Option<String>,
}

impl BotIdentity {
    #[must_use]
    pub fn authored(&self, user_id: Option<&str>, bot_id: Option<&str>) -> bool {
        let same_user = user_id.is_some_and(|u| u == self.user_id);
        let same_bot = match (bot_id, self.bot_id.as_deref()) {
            (Some(theirs), Some(ours)) => theirs == ours,
            _ => false,
        };
        same_user || same_bot
    }
}

/// Normalized conversation text handed to the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub line_count: usize,
}

/// Outcome of transcript collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Transcript(Transcript),
    /// Too little activity to be worth a model call.
    InsufficientData { line_count: usize, minimum: usize },
}
