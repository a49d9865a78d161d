//! Slack API client module
//!
//! Encapsulates all Slack Web API interactions with timeouts, a single retry
//! on transport failures, and error handling.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde_json::{Value, json};
use slack_morphism::events::SlackMessageEventType;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::SlackApiConversationsHistoryRequest;
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackCursorId, SlackHistoryMessage,
    SlackTs,
};
use tracing::{debug, warn};

use crate::core::config::DEFAULT_PLATFORM_TIMEOUT_SECS;
use crate::core::models::{Author, BotIdentity, ChatMessage};
use crate::core::platform::ChatPlatform;
use crate::errors::RecapError;
use crate::utils::retry::{with_timeout, with_transient_retry};

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size for `conversations.history`; Slack caps it at 1000.
const HISTORY_PAGE_SIZE: u16 = 200;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a RecapError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

/// Converts a Slack message timestamp (`"1716206400.123456"`) to UTC.
#[must_use]
pub fn parse_slack_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = format!("{frac:0<6}").get(..6)?.parse().ok()?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

/// Formats a UTC instant as a Slack timestamp suitable for `oldest`.
#[must_use]
pub fn to_slack_ts(at: DateTime<Utc>) -> String {
    format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}

/// Join/leave notices and similar housekeeping entries are not conversation.
fn is_system_message(msg: &SlackHistoryMessage) -> bool {
    matches!(
        msg.subtype,
        Some(
            SlackMessageEventType::ChannelJoin | SlackMessageEventType::ChannelLeave
        )
    )
}

/// Reads `ok`/`error` from a Web API response body.
fn check_ok(method: &str, body: &Value) -> Result<(), RecapError> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        Ok(())
    } else {
        Err(RecapError::PlatformError(format!(
            "{method} error: {}",
            body.get("error").and_then(Value::as_str).unwrap_or("unknown")
        )))
    }
}

/// Builds an [`Author`] from a `users.info` response.
fn author_from_user_info(user_id: &str, body: &Value) -> Author {
    let user = body.get("user");
    let text = |v: Option<&Value>| v.and_then(Value::as_str).unwrap_or_default().to_string();

    let username = text(user.and_then(|u| u.get("name")));
    Author {
        user_id: user_id.to_string(),
        display_name: text(
            user.and_then(|u| u.get("profile"))
                .and_then(|p| p.get("display_name")),
        ),
        username: if username.is_empty() {
            user_id.to_string()
        } else {
            username
        },
        is_bot: user
            .and_then(|u| u.get("is_bot"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

/// Stand-in for a user whose profile could not be fetched.
fn fallback_author(user_id: &str) -> Author {
    Author {
        user_id: user_id.to_string(),
        display_name: String::new(),
        username: user_id.to_string(),
        is_bot: false,
    }
}

/// Flattens `conversations.history` pages, fetched in cursor order with each
/// page newest first, into one oldest-first list without housekeeping entries.
fn chronological(pages: Vec<Vec<SlackHistoryMessage>>) -> Vec<SlackHistoryMessage> {
    let mut raw: Vec<SlackHistoryMessage> = pages.into_iter().flatten().collect();
    raw.reverse();
    raw.retain(|msg| !is_system_message(msg));
    raw
}

/// User ids that need a `users.info` lookup; bot posts carry their own name.
fn human_author_ids(raw: &[SlackHistoryMessage]) -> HashSet<String> {
    raw.iter()
        .filter(|msg| msg.sender.bot_id.is_none())
        .filter_map(|msg| msg.sender.user.as_ref().map(|u| u.0.clone()))
        .collect()
}

/// Attaches resolved authors to history entries, keeping their order.
/// Entries with an unreadable `ts` are skipped.
fn to_chat_messages(
    raw: Vec<SlackHistoryMessage>,
    authors: &HashMap<String, Author>,
) -> Vec<ChatMessage> {
    raw.into_iter()
        .filter_map(|msg| {
            let timestamp = parse_slack_ts(&msg.origin.ts.0)?;
            let author = match (&msg.sender.user, &msg.sender.bot_id) {
                (Some(user), None) => authors
                    .get(&user.0)
                    .cloned()
                    .unwrap_or_else(|| fallback_author(&user.0)),
                (user, _) => Author {
                    user_id: user.as_ref().map(|u| u.0.clone()).unwrap_or_default(),
                    display_name: msg.sender.username.clone().unwrap_or_default(),
                    username: msg.sender.username.clone().unwrap_or_default(),
                    is_bot: true,
                },
            };
            Some(ChatMessage {
                author,
                content: msg.content.text.unwrap_or_default(),
                timestamp,
            })
        })
        .collect()
}

/// Slack Web API client; the production [`ChatPlatform`].
pub struct SlackClient {
    token: SlackApiToken,
    http: Client,
    timeout: Duration,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_timeout(token, Duration::from_secs(DEFAULT_PLATFORM_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn with_timeout(token: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            http,
            timeout,
        }
    }

    #[must_use]
    pub fn token(&self) -> &SlackApiToken {
        &self.token
    }

    async fn with_retry<F, Fut, T>(&self, what: &str, mut operation: F) -> Result<T, RecapError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RecapError>>,
    {
        let limit = self.timeout;
        with_transient_retry(|| with_timeout(limit, what, operation())).await
    }

    /// GET a read-only Web API method with query parameters.
    async fn api_get(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, RecapError> {
        let resp = self
            .http
            .get(format!("{SLACK_API_BASE}/{method}"))
            .bearer_auth(&self.token.token_value.0)
            .query(params)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RecapError::PlatformError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| RecapError::PlatformError(format!("{method} JSON parse error: {e}")))?;
        check_ok(method, &body)?;
        Ok(body)
    }

    /// POST a JSON payload to a writing Web API method.
    async fn api_post(&self, method: &str, payload: &Value) -> Result<Value, RecapError> {
        let resp = self
            .http
            .post(format!("{SLACK_API_BASE}/{method}"))
            .bearer_auth(&self.token.token_value.0)
            .json(payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RecapError::PlatformError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| RecapError::PlatformError(format!("{method} JSON parse error: {e}")))?;
        check_ok(method, &body)?;
        Ok(body)
    }

    /// One page of `conversations.history`, newest first as Slack returns it.
    async fn history_page(
        &self,
        channel_id: &str,
        oldest: &str,
        cursor: Option<&SlackCursorId>,
    ) -> Result<(Vec<SlackHistoryMessage>, Option<SlackCursorId>), RecapError> {
        let session = SLACK_CLIENT
            .as_ref()
            .ok_or_else(|| {
                RecapError::GeneralError("Slack HTTP connector not initialized".to_string())
            })?
            .open_session(&self.token);

        let mut request = SlackApiConversationsHistoryRequest::new()
            .with_channel(SlackChannelId(channel_id.to_string()))
            .with_oldest(SlackTs(oldest.to_string()))
            .with_limit(HISTORY_PAGE_SIZE);
        if let Some(cursor) = cursor {
            request = request.with_cursor(cursor.clone());
        }

        let result = session.conversations_history(&request).await?;
        let next_cursor = result
            .response_metadata
            .and_then(|meta| meta.next_cursor)
            .filter(|c| !c.0.is_empty());

        Ok((result.messages, next_cursor))
    }

    /// Looks up display name, username and bot flag for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if `users.info` fails after the retry.
    pub async fn get_user_info(&self, user_id: &str) -> Result<Author, RecapError> {
        let params = [("user", user_id)];
        let body = self
            .with_retry("users.info", || self.api_get("users.info", &params))
            .await?;
        Ok(author_from_user_info(user_id, &body))
    }

    async fn resolve_authors(&self, user_ids: HashSet<String>) -> HashMap<String, Author> {
        let fetches = user_ids
            .iter()
            .map(|uid| async move { (uid.clone(), self.get_user_info(uid).await) });

        let mut authors = HashMap::new();
        for (uid, res) in join_all(fetches).await {
            match res {
                Ok(author) => {
                    authors.insert(uid, author);
                }
                Err(e) => {
                    warn!("Failed to get user info for {}: {}", uid, e);
                    let author = fallback_author(&uid);
                    authors.insert(uid, author);
                }
            }
        }
        authors
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn history_after(
        &self,
        channel_id: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<ChatMessage>, RecapError> {
        let oldest = to_slack_ts(after);
        let mut pages: Vec<Vec<SlackHistoryMessage>> = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let (page, next) = self
                .with_retry("conversations.history", || {
                    self.history_page(channel_id, &oldest, cursor.as_ref())
                })
                .await?;
            pages.push(page);
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let raw = chronological(pages);
        let authors = self.resolve_authors(human_author_ids(&raw)).await;

        debug!(
            channel_id,
            messages = raw.len(),
            authors = authors.len(),
            "Fetched channel history"
        );

        Ok(to_chat_messages(raw, &authors))
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<String, RecapError> {
        let payload = json!({
            "channel": channel_id,
            "text": text,
        });

        // Not retried: a lost response may still have posted the message.
        let body = with_timeout(
            self.timeout,
            "chat.postMessage",
            self.api_post("chat.postMessage", &payload),
        )
        .await?;

        body.get("ts")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| RecapError::PlatformError("chat.postMessage returned no ts".to_string()))
    }

    async fn update_message(
        &self,
        channel_id: &str,
        message_ref: &str,
        text: &str,
    ) -> Result<(), RecapError> {
        let payload = json!({
            "channel": channel_id,
            "ts": message_ref,
            "text": text,
        });

        self.with_retry("chat.update", || self.api_post("chat.update", &payload))
            .await
            .map(|_| ())
    }

    async fn context_label(&self, _channel_id: &str) -> Result<Option<String>, RecapError> {
        let body = self
            .with_retry("team.info", || self.api_get("team.info", &[]))
            .await?;
        Ok(body
            .get("team")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(ToString::to_string))
    }

    async fn bot_identity(&self) -> Result<BotIdentity, RecapError> {
        let payload = json!({});
        let body = self
            .with_retry("auth.test", || self.api_post("auth.test", &payload))
            .await?;

        let user_id = body
            .get("user_id")
            .and_then(Value::as_str)
            .ok_or_else(|| RecapError::PlatformError("auth.test returned no user_id".to_string()))?;

        Ok(BotIdentity {
            user_id: user_id.to_string(),
            bot_id: body
                .get("bot_id")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        })
    }
}
