//! Transcript collection: fetch recent channel history and render it into a
//! bounded, normalized block of `name: content` lines.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::core::models::{
    Author, BotIdentity, ChatMessage, Collected, NameOverride, Transcript,
};
use crate::core::platform::ChatPlatform;
use crate::errors::RecapError;
use crate::utils::filters::filter_user_messages;

/// Longest message body kept verbatim, in characters.
pub const MAX_CONTENT_CHARS: usize = 300;

/// Appended to message bodies cut at [`MAX_CONTENT_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

/// Upper bound on the joined transcript, in characters.
pub const MAX_TRANSCRIPT_CHARS: usize = 10_000;

/// Fewer lines than this is not worth a model call.
pub const MIN_TRANSCRIPT_LINES: usize = 3;

/// Picks the label a message author gets in the transcript.
///
/// Priority: configured alias, then the stable username for degenerate
/// display names, then the display name untouched.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    overrides: HashMap<String, String>,
    degenerate: HashSet<String>,
}

impl NameResolver {
    #[must_use]
    pub fn new(overrides: &[NameOverride], degenerate_names: &[String]) -> Self {
        Self {
            overrides: overrides
                .iter()
                .map(|o| (o.source_name.clone(), o.alias.clone()))
                .collect(),
            degenerate: degenerate_names.iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn resolve<'a>(&'a self, author: &'a Author) -> &'a str {
        let name = author.display_name.as_str();
        if let Some(alias) = self.overrides.get(name) {
            alias.as_str()
        } else if name.trim().is_empty() || self.degenerate.contains(name) {
            author.username.as_str()
        } else {
            name
        }
    }
}

/// Cuts a message body to [`MAX_CONTENT_CHARS`] characters plus the marker.
#[must_use]
pub fn truncate_content(content: &str) -> String {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &content[..cut]),
        None => content.to_string(),
    }
}

/// Keeps only the trailing [`MAX_TRANSCRIPT_CHARS`] characters. May cut
/// through a line, never through a character.
#[must_use]
pub fn cap_transcript(text: &str) -> &str {
    let total = text.chars().count();
    if total <= MAX_TRANSCRIPT_CHARS {
        return text;
    }
    let skip = total - MAX_TRANSCRIPT_CHARS;
    match text.char_indices().nth(skip) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}

/// Collects channel history into a transcript.
pub struct Collector {
    resolver: NameResolver,
}

impl Collector {
    #[must_use]
    pub fn new(resolver: NameResolver) -> Self {
        Self { resolver }
    }

    /// Renders already-filtered messages, in the order given.
    #[must_use]
    pub fn render(&self, messages: &[ChatMessage]) -> Collected {
        let lines: Vec<String> = messages
            .iter()
            .map(|msg| {
                format!(
                    "{}: {}",
                    self.resolver.resolve(&msg.author),
                    truncate_content(&msg.content)
                )
            })
            .collect();

        if lines.len() < MIN_TRANSCRIPT_LINES {
            return Collected::InsufficientData {
                line_count: lines.len(),
                minimum: MIN_TRANSCRIPT_LINES,
            };
        }

        let full_text = lines.join("\n");
        Collected::Transcript(Transcript {
            text: cap_transcript(&full_text).to_string(),
            line_count: lines.len(),
        })
    }

    /// Fetches everything posted in `channel_id` after `cutoff`, drops bot
    /// traffic and renders the rest.
    ///
    /// # Errors
    ///
    /// Propagates history fetch failures from the platform.
    pub async fn collect(
        &self,
        platform: &dyn ChatPlatform,
        bot: &BotIdentity,
        channel_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Collected, RecapError> {
        let history = platform.history_after(channel_id, cutoff).await?;
        let fetched = history.len();

        let messages = filter_user_messages(history, bot);

        info!(
            channel_id,
            fetched,
            kept = messages.len(),
            "Filtered channel history for summarization"
        );

        Ok(self.render(&messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(display_name: &str, username: &str) -> Author {
        Author {
            user_id: format!("U-{username}"),
            display_name: display_name.to_string(),
            username: username.to_string(),
            is_bot: false,
        }
    }

    fn resolver() -> NameResolver {
        NameResolver::new(
            &[
                NameOverride {
                    source_name: "###".to_string(),
                    alias: "Diver".to_string(),
                },
                NameOverride {
                    source_name: "Jules".to_string(),
                    alias: "Julie".to_string(),
                },
                NameOverride {
                    source_name: "?".to_string(),
                    alias: "Questioner".to_string(),
                },
            ],
            &[".".to_string(), "?".to_string(), "??".to_string(), "!".to_string()],
        )
    }

    #[test]
    fn test_override_wins_over_valid_display_name() {
        let r = resolver();
        let a = author("Jules", "jules.w");
        assert_eq!(r.resolve(&a), "Julie");
    }

    #[test]
    fn test_override_wins_over_degenerate_check() {
        let r = resolver();
        assert_eq!(r.resolve(&author("?", "qq")), "Questioner");
        assert_eq!(r.resolve(&author("###", "diver99")), "Diver");
    }

    #[test]
    fn test_degenerate_names_fall_back_to_username() {
        let r = resolver();
        for name in ["", "   ", ".", "??", "!"] {
            let a = author(name, "stable_handle");
            assert_eq!(r.resolve(&a), "stable_handle", "display name {name:?}");
        }
    }

    #[test]
    fn test_ordinary_names_kept() {
        let r = resolver();
        assert_eq!(r.resolve(&author("Mina", "mina.k")), "Mina");
        // Only exact members of the degenerate set count.
        assert_eq!(r.resolve(&author("?!", "x")), "?!");
    }

    #[test]
    fn test_truncate_content_limits() {
        let short = "a".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_content(&short), short);

        let long = "b".repeat(MAX_CONTENT_CHARS + 57);
        let cut = truncate_content(&long);
        assert_eq!(cut, format!("{}...", "b".repeat(MAX_CONTENT_CHARS)));
        assert_eq!(cut.chars().count(), MAX_CONTENT_CHARS + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_truncate_content_counts_characters_not_bytes() {
        let korean = "가".repeat(MAX_CONTENT_CHARS + 1);
        let cut = truncate_content(&korean);
        assert!(cut.starts_with(&"가".repeat(MAX_CONTENT_CHARS)));
        assert_eq!(cut.chars().count(), MAX_CONTENT_CHARS + 3);

        let fits = "가".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_content(&fits), fits);
    }

    #[test]
    fn test_cap_transcript_keeps_tail() {
        let small = "x".repeat(MAX_TRANSCRIPT_CHARS);
        assert_eq!(cap_transcript(&small), small);

        let mut big = "head-".repeat(100);
        big.push_str(&"y".repeat(MAX_TRANSCRIPT_CHARS));
        let capped = cap_transcript(&big);
        assert_eq!(capped.chars().count(), MAX_TRANSCRIPT_CHARS);
        assert_eq!(capped, "y".repeat(MAX_TRANSCRIPT_CHARS));
    }

    #[test]
    fn test_cap_transcript_multibyte_boundary() {
        let text = format!("a{}", "한".repeat(MAX_TRANSCRIPT_CHARS));
        let capped = cap_transcript(&text);
        assert_eq!(capped, "한".repeat(MAX_TRANSCRIPT_CHARS));
    }
}
