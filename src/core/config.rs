use std::env;
use std::time::Duration;

use super::models::NameOverride;
use crate::errors::RecapError;

pub const DEFAULT_TRIGGER: &str = "!summarize";
pub const DEFAULT_LOOKBACK_HOURS: u32 = 12;
/// Thirty days.
pub const MAX_LOOKBACK_HOURS: u32 = 24 * 30;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_DEGENERATE_NAMES: [&str; 4] = [".", "?", "??", "!"];
pub const DEFAULT_SUMMARY_TONE: &str = "casual and blunt, like a longtime regular of an online \
    community who roasts their friends; cheeky jokes are welcome";
pub const DEFAULT_PLATFORM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub slack_app_token: String,
    pub openai_api_key: String,
    pub openai_org_id: Option<String>,
    pub openai_model: Option<String>,
    pub trigger: String,
    pub lookback_hours: u32,
    pub name_overrides: Vec<NameOverride>,
    pub degenerate_names: Vec<String>,
    pub summary_tone: String,
    pub platform_timeout: Duration,
    pub model_timeout: Duration,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or an optional
    /// one cannot be parsed.
    pub fn from_env() -> Result<Self, RecapError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RecapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| RecapError::ConfigError(format!("{key} is not set")))
        };

        let name_overrides = match lookup("RECAP_NAME_OVERRIDES") {
            Some(raw) => serde_json::from_str::<Vec<NameOverride>>(&raw)
                .map_err(|e| RecapError::ConfigError(format!("RECAP_NAME_OVERRIDES: {e}")))?,
            None => Vec::new(),
        };

        let degenerate_names = match lookup("RECAP_DEGENERATE_NAMES") {
            Some(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| RecapError::ConfigError(format!("RECAP_DEGENERATE_NAMES: {e}")))?,
            None => DEFAULT_DEGENERATE_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        let lookback_hours = parse_number(&lookup, "RECAP_LOOKBACK_HOURS", DEFAULT_LOOKBACK_HOURS)?;
        if !(1..=MAX_LOOKBACK_HOURS).contains(&lookback_hours) {
            return Err(RecapError::ConfigError(format!(
                "RECAP_LOOKBACK_HOURS must be between 1 and {MAX_LOOKBACK_HOURS}"
            )));
        }

        Ok(Self {
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            slack_app_token: required("SLACK_APP_TOKEN")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_org_id: lookup("OPENAI_ORG_ID"),
            openai_model: lookup("OPENAI_MODEL"),
            trigger: lookup("RECAP_TRIGGER").unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
            lookback_hours,
            name_overrides,
            degenerate_names,
            summary_tone: lookup("RECAP_SUMMARY_TONE")
                .unwrap_or_else(|| DEFAULT_SUMMARY_TONE.to_string()),
            platform_timeout: parse_timeout(
                &lookup,
                "RECAP_PLATFORM_TIMEOUT_SECS",
                DEFAULT_PLATFORM_TIMEOUT_SECS,
            )?,
            model_timeout: parse_timeout(
                &lookup,
                "RECAP_MODEL_TIMEOUT_SECS",
                DEFAULT_MODEL_TIMEOUT_SECS,
            )?,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.openai_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, RecapError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| RecapError::ConfigError(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

fn parse_timeout<F>(lookup: &F, key: &str, default_secs: u64) -> Result<Duration, RecapError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_number(lookup, key, default_secs)? {
        0 => Err(RecapError::ConfigError(format!("{key} must be at least 1"))),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SLACK_BOT_TOKEN", "xoxb-test"),
        ("SLACK_APP_TOKEN", "xapp-test"),
        ("OPENAI_API_KEY", "sk-test"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.trigger, "!summarize");
        assert_eq!(config.lookback_hours, 12);
        assert_eq!(config.model(), "gpt-3.5-turbo");
        assert!(config.name_overrides.is_empty());
        assert_eq!(config.degenerate_names, vec![".", "?", "??", "!"]);
        assert_eq!(config.platform_timeout, Duration::from_secs(30));
        assert_eq!(config.model_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_missing_required_token_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        match err {
            RecapError::ConfigError(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("Expected ConfigError, got: {other:?}"),
        }
    }

    #[test]
    fn test_blank_required_token_is_fatal() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("SLACK_BOT_TOKEN", "   ");
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_name_overrides_parsed_from_json() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push((
            "RECAP_NAME_OVERRIDES",
            r####"[{"source_name":"###","alias":"Diver"},{"source_name":"-","alias":"Dash"}]"####,
        ));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(
            config.name_overrides,
            vec![
                NameOverride {
                    source_name: "###".to_string(),
                    alias: "Diver".to_string()
                },
                NameOverride {
                    source_name: "-".to_string(),
                    alias: "Dash".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_malformed_optional_values_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECAP_LOOKBACK_HOURS", "twelve"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECAP_LOOKBACK_HOURS", "0"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECAP_NAME_OVERRIDES", "{not json"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_lookback_upper_bound() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECAP_LOOKBACK_HOURS", "4294967295"));
        match AppConfig::from_lookup(lookup_from(&pairs)) {
            Err(RecapError::ConfigError(msg)) => assert!(msg.contains("RECAP_LOOKBACK_HOURS")),
            other => panic!("Expected ConfigError, got: {other:?}"),
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECAP_LOOKBACK_HOURS", "720"));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.lookback_hours, MAX_LOOKBACK_HOURS);
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        for key in ["RECAP_PLATFORM_TIMEOUT_SECS", "RECAP_MODEL_TIMEOUT_SECS"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, "0"));
            match AppConfig::from_lookup(lookup_from(&pairs)) {
                Err(RecapError::ConfigError(msg)) => assert!(msg.contains(key)),
                other => panic!("Expected ConfigError for {key}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn test_overrides_for_trigger_and_model() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RECAP_TRIGGER", "!recap"));
        pairs.push(("OPENAI_MODEL", "gpt-4o-mini"));
        pairs.push(("RECAP_MODEL_TIMEOUT_SECS", "45"));
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.trigger, "!recap");
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.model_timeout, Duration::from_secs(45));
    }
}
