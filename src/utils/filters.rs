use crate::core::models::{BotIdentity, ChatMessage};

/// Filters a list of channel messages, retaining only those written by people:
/// anything from this bot or from any other automated account is dropped.
#[must_use]
pub fn filter_user_messages(messages: Vec<ChatMessage>, bot: &BotIdentity) -> Vec<ChatMessage> {
    messages
        .into_iter()
        .filter(|msg| {
            let is_from_this_bot = msg.author.user_id == bot.user_id;
            !msg.author.is_bot && !is_from_this_bot
        })
        .collect()
}
