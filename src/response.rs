//! User-visible status texts for the placeholder message.
//!
//! Every summarization posts [`placeholder_text`] once and later replaces it
//! with exactly one of the other texts.

use crate::errors::RecapError;

/// Marker that starts every failure notice.
pub const ERROR_MARKER: &str = ":x:";

/// Marker for notices that explain why there is no summary without anything
/// having gone wrong.
pub const INFO_MARKER: &str = ":information_source:";

#[must_use]
pub fn placeholder_text(lookback_hours: u32) -> String {
    format!(
        ":hourglass_flowing_sand: Collecting and analyzing the last {lookback_hours} hours of conversation..."
    )
}

/// Wraps the model output in the result header. The summary itself is left
/// untouched.
#[must_use]
pub fn summary_text(lookback_hours: u32, summary: &str) -> String {
    format!("*:bar_chart: Summary of the last {lookback_hours} hours*\n\n{summary}")
}

#[must_use]
pub fn insufficient_activity_text(lookback_hours: u32) -> String {
    format!(
        "{INFO_MARKER} There was too little conversation in the last {lookback_hours} hours to summarize!"
    )
}

#[must_use]
pub fn error_text(error: &RecapError) -> String {
    format!("{ERROR_MARKER} An error occurred: {error}")
}
