/// System role given to the model on every request.
pub const SYSTEM_PROMPT: &str = "You are a scribe who summarizes chat conversations clearly.";

/// Max length for the context label (after which we truncate in the prompt)
pub const MAX_CONTEXT_LABEL_LEN: usize = 100;

/// Used when the platform cannot name the space a channel belongs to.
pub const FALLBACK_CONTEXT_LABEL: &str = "this channel";

/// Remove control characters and hard-truncate a workspace/channel label before
/// it is embedded in the prompt. Labels come from the platform, not from us.
#[must_use]
pub fn sanitize_context_label(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_CONTEXT_LABEL_LEN)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_CONTEXT_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds the user-role prompt: instructions, the two required output
/// sections, then the transcript itself.
#[must_use]
pub fn build_summary_prompt(
    transcript: &str,
    context_label: &str,
    lookback_hours: u32,
    tone: &str,
) -> String {
    let label = sanitize_context_label(context_label);
    format!(
        "Below is the conversation log of '{label}' from the last {lookback_hours} hours.\n\
         Summarize it while strictly following these core rules.\n\
         \n\
         CORE RULES (very important):\n\
         1. Describe every topic concretely; never lump things together.\n\
         \x20  - (games) 'talked about games' (X) -> 'lost three ranked games in a row and blamed the jungler' (O)\n\
         \x20  - (food) 'recommended dinner' (X) -> 'shared a link to a spicy noodle place near the station' (O)\n\
         \x20  - (dev) 'asked a coding question' (X) -> 'broke down because a Python indentation error kept the script from running' (O)\n\
         \x20  - (daily life) 'does not want to go to school' (X) -> 'whined about having a 9am class tomorrow' (O)\n\
         \x20  Tone: {tone}.\n\
         2. Keep 100% of proper nouns and keywords:\n\
         \x20  - Never drop concrete names that appear in the log (games, places, brands, languages, people); copy them into the summary as written.\n\
         \n\
         ---\n\
         \n\
         1. **Overall summary**:\n\
         \x20  - Format: \"Over the last {lookback_hours} hours, '{label}' was heated about [key keywords].\"\n\
         \x20  - Then walk through the concrete issues in the order the conversation flowed: who, what, when, where, why and how.\n\
         \n\
         2. **Per-participant summary**:\n\
         \x20  - Format: \"name: [what they concretely said]\"\n\
         \x20  - Use every name exactly as it appears in the log; do not change it.\n\
         \x20  - In one line, say what each person talked about and how they concretely reacted. A bare 'agreed' or 'disagreed' is not allowed.\n\
         \n\
         [Conversation log]\n\
         {transcript}\n"
    )
}
