//! Event coordination: trigger matching and the placeholder/edit protocol
//! around the collect -> summarize pipeline.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::collect::Collector;
use crate::core::models::{BotIdentity, Collected, IncomingMessage};
use crate::core::platform::{ChatPlatform, SummaryProvider};
use crate::errors::RecapError;
use crate::prompt::FALLBACK_CONTEXT_LABEL;
use crate::response::{
    error_text, insufficient_activity_text, placeholder_text, summary_text,
};

/// How a single inbound message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Not a trigger, or written by a bot.
    Ignored,
    Summarized,
    InsufficientActivity,
    /// The pipeline failed and the placeholder now carries an error notice.
    Failed,
    /// The placeholder itself could not be posted or edited.
    Undelivered,
}

enum PipelineResult {
    Summary(String),
    Insufficient,
}

/// Listens for the trigger token and runs one summarization per match.
pub struct SummaryBot {
    platform: Arc<dyn ChatPlatform>,
    provider: Arc<dyn SummaryProvider>,
    collector: Collector,
    identity: BotIdentity,
    trigger: String,
    lookback_hours: u32,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl SummaryBot {
    #[must_use]
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        provider: Arc<dyn SummaryProvider>,
        collector: Collector,
        identity: BotIdentity,
        trigger: String,
        lookback_hours: u32,
    ) -> Self {
        Self {
            platform,
            provider,
            collector,
            identity,
            trigger,
            lookback_hours,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Token that aborts every in-flight summarization when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Tracks the tasks spawned by [`SummaryBot::dispatch`].
    #[must_use]
    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    /// Own messages and other bots are dropped before the trigger is even
    /// looked at. The trigger is an exact, case-sensitive match on the whole
    /// message text.
    #[must_use]
    pub fn is_trigger(&self, message: &IncomingMessage) -> bool {
        if self
            .identity
            .authored(message.user_id.as_deref(), message.bot_id.as_deref())
            || message.bot_id.is_some()
        {
            return false;
        }
        message.text == self.trigger
    }

    /// Spawns handling of `message` on the bot's task tracker so the event
    /// listener is never blocked. Returns whether a task was started.
    pub fn dispatch(self: &Arc<Self>, message: IncomingMessage) -> bool {
        if !self.is_trigger(&message) {
            return false;
        }
        let bot = Arc::clone(self);
        self.tasks.spawn(async move {
            bot.handle_message(message).await;
        });
        true
    }

    /// Runs the full placeholder -> pipeline -> edit protocol for one message.
    /// Never returns an error: every failure ends up in the edited placeholder
    /// and the log.
    pub async fn handle_message(&self, message: IncomingMessage) -> HandleOutcome {
        if !self.is_trigger(&message) {
            return HandleOutcome::Ignored;
        }

        let channel_id = message.channel_id.as_str();
        info!(
            channel_id,
            user_id = ?message.user_id,
            "Summarization triggered"
        );

        let placeholder = match self
            .platform
            .post_message(channel_id, &placeholder_text(self.lookback_hours))
            .await
        {
            Ok(message_ref) => message_ref,
            Err(e) => {
                error!(channel_id, "Failed to post placeholder message: {}", e);
                return HandleOutcome::Undelivered;
            }
        };

        let started = Instant::now();
        let result = tokio::select! {
            () = self.shutdown.cancelled() => Err(RecapError::Cancelled),
            result = self.run_pipeline(channel_id) => result,
        };

        let (text, outcome) = match result {
            Ok(PipelineResult::Summary(summary)) => (
                summary_text(self.lookback_hours, &summary),
                HandleOutcome::Summarized,
            ),
            Ok(PipelineResult::Insufficient) => (
                insufficient_activity_text(self.lookback_hours),
                HandleOutcome::InsufficientActivity,
            ),
            Err(e) => {
                error!(channel_id, "Failed to generate summary: {}", e);
                (error_text(&e), HandleOutcome::Failed)
            }
        };

        if let Err(e) = self
            .platform
            .update_message(channel_id, &placeholder, &text)
            .await
        {
            error!(channel_id, "Failed to update placeholder message: {}", e);
            return HandleOutcome::Undelivered;
        }

        info!(
            channel_id,
            outcome = ?outcome,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Summarization finished"
        );
        outcome
    }

    async fn run_pipeline(&self, channel_id: &str) -> Result<PipelineResult, RecapError> {
        let cutoff = ChronoDuration::try_hours(i64::from(self.lookback_hours))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                RecapError::GeneralError(format!(
                    "Lookback of {} hours is out of range",
                    self.lookback_hours
                ))
            })?;

        let transcript = match self
            .collector
            .collect(self.platform.as_ref(), &self.identity, channel_id, cutoff)
            .await?
        {
            Collected::Transcript(transcript) => transcript,
            Collected::InsufficientData { line_count, minimum } => {
                info!(
                    channel_id,
                    line_count, minimum, "Not enough activity to summarize"
                );
                return Ok(PipelineResult::Insufficient);
            }
        };

        let context_label = match self.platform.context_label(channel_id).await {
            Ok(Some(label)) => label,
            Ok(None) => FALLBACK_CONTEXT_LABEL.to_string(),
            Err(e) => {
                warn!(channel_id, "Failed to look up context label: {}", e);
                FALLBACK_CONTEXT_LABEL.to_string()
            }
        };

        info!(
            channel_id,
            lines = transcript.line_count,
            chars = transcript.text.chars().count(),
            "Transcript ready, requesting summary"
        );

        let summary = self
            .provider
            .summarize(&transcript.text, &context_label)
            .await?;
        Ok(PipelineResult::Summary(summary))
    }
}
