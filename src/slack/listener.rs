//! Socket Mode wiring: turns Slack push events into [`IncomingMessage`]s for
//! the [`SummaryBot`].

use std::sync::Arc;
use std::time::Duration;

use slack_morphism::prelude::*;
use tracing::{info, warn};

use crate::ai::LlmClient;
use crate::bot::SummaryBot;
use crate::collect::{Collector, NameResolver};
use crate::core::config::AppConfig;
use crate::core::models::IncomingMessage;
use crate::core::platform::ChatPlatform;
use crate::slack::client::SlackClient;

/// How long shutdown waits for in-flight summaries to post their final edit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Maps a Slack message event to the platform-neutral shape. Edits,
/// deletions, joins and other subtyped events never trigger anything.
#[must_use]
pub fn incoming_from_event(event: &SlackMessageEvent) -> Option<IncomingMessage> {
    if event.subtype.is_some() {
        return None;
    }
    let channel_id = event.origin.channel.as_ref()?.0.clone();
    let text = event
        .content
        .as_ref()
        .and_then(|c| c.text.clone())
        .unwrap_or_default();

    Some(IncomingMessage {
        channel_id,
        user_id: event.sender.user.as_ref().map(|u| u.0.clone()),
        bot_id: event.sender.bot_id.as_ref().map(|b| b.0.clone()),
        text,
    })
}

async fn on_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackHyperClient>,
    states: SlackClientEventsUserState,
) -> UserCallbackResult<()> {
    let SlackEventCallbackBody::Message(message_event) = event.event else {
        return Ok(());
    };
    let Some(incoming) = incoming_from_event(&message_event) else {
        return Ok(());
    };

    let bot = {
        let storage = states.read().await;
        storage.get_user_state::<Arc<SummaryBot>>().cloned()
    };

    match bot {
        Some(bot) => {
            bot.dispatch(incoming);
        }
        None => warn!("Summary bot missing from listener state"),
    }
    Ok(())
}

/// Builds every collaborator from `config`, connects over Socket Mode and
/// serves events until the process is asked to stop.
///
/// # Errors
///
/// Returns an error if the bot identity cannot be fetched or the Socket Mode
/// connection cannot be opened.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let slack_client = Arc::new(SlackClient::with_timeout(
        config.slack_bot_token.clone(),
        config.platform_timeout,
    ));
    let identity = slack_client.bot_identity().await?;
    info!(
        bot_user_id = %identity.user_id,
        bot_id = ?identity.bot_id,
        "Authenticated with Slack"
    );

    let llm_client = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_org_id.clone(),
        config.model().to_string(),
    )
    .with_lookback_hours(config.lookback_hours)
    .with_tone(config.summary_tone.clone())
    .with_timeout(config.model_timeout);

    let collector = Collector::new(NameResolver::new(
        &config.name_overrides,
        &config.degenerate_names,
    ));

    let bot = Arc::new(SummaryBot::new(
        slack_client,
        Arc::new(llm_client),
        collector,
        identity,
        config.trigger.clone(),
        config.lookback_hours,
    ));

    let connector = SlackClientHyperConnector::new()
        .map_err(|e| anyhow::anyhow!("Failed to create Slack HTTP connector: {e}"))?;
    let client = Arc::new(SlackHyperClient::new(connector));

    let callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(on_push_event);
    let environment = Arc::new(
        SlackClientEventsListenerEnvironment::new(client).with_user_state(Arc::clone(&bot)),
    );
    let listener = SlackClientSocketModeListener::new(
        &SlackClientSocketModeConfig::new(),
        environment,
        callbacks,
    );

    let app_token = SlackApiToken::new(SlackApiTokenValue::new(config.slack_app_token.clone()));
    listener
        .listen_for(&app_token)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open Socket Mode connection: {e}"))?;

    info!(trigger = %config.trigger, "Listening for summarize requests");
    listener.serve().await;

    info!("Shutting down, cancelling in-flight summaries");
    bot.shutdown_token().cancel();
    bot.tasks().close();
    if tokio::time::timeout(SHUTDOWN_GRACE, bot.tasks().wait())
        .await
        .is_err()
    {
        warn!("In-flight summaries did not finish before shutdown");
    }
    Ok(())
}
