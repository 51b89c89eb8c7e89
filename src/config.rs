/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use crate::error::ConfigError;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default cap on the length of an outbound message, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 3000;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Destination chat: a numeric chat id (`-1001234567890`) or a public channel username
/// (`@channel`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Handle(String),
}

impl ChatId {
    fn is_blank(&self) -> bool {
        match self {
            ChatId::Id(_) => false,
            ChatId::Handle(h) => h.trim().is_empty(),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(handle: &str) -> Self {
        ChatId::Handle(handle.to_owned())
    }
}

impl From<String> for ChatId {
    fn from(handle: String) -> Self {
        ChatId::Handle(handle)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Handle(h) => f.write_str(h),
        }
    }
}

fn redact(token: &Option<String>, f: &mut fmt::Formatter) -> fmt::Result {
    match token {
        Some(_) => f.write_str("Some([REDACTED])"),
        None => f.write_str("None"),
    }
}

/// `SinkConfig` holds everything needed to reach one Telegram chat. It can be built in code or
/// deserialized from the host's configuration, e.g.
///
/// ```json
/// { "chat_id": "@ops_alerts", "bot_token": "123456:abcde", "substitution_max_length": 3000 }
/// ```
///
/// Nothing is checked until the config is handed to `Sink::initialize`.
#[derive(Derivative, Clone, Deserialize)]
#[derivative(Debug)]
#[serde(default)]
pub struct SinkConfig {
    chat_id: Option<ChatId>,
    #[derivative(Debug(format_with = "redact"))]
    bot_token: Option<String>,
    substitution_max_length: usize,
    api_url: String,
    timeout_ms: Option<u64>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            chat_id: None,
            bot_token: None,
            substitution_max_length: DEFAULT_MAX_LENGTH,
            api_url: DEFAULT_API_URL.to_owned(),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl SinkConfig {
    pub fn new(chat_id: impl Into<ChatId>, bot_token: impl Into<String>) -> Self {
        SinkConfig {
            chat_id: Some(chat_id.into()),
            bot_token: Some(bot_token.into()),
            ..SinkConfig::default()
        }
    }

    /// Maximum number of characters sent per message, truncation marker included.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.substitution_max_length = max_length;
        self
    }

    /// Point the sink at another Bot API server, e.g. a self-hosted one.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Request timeout of the HTTP client, kept at millisecond precision. `None` lets a send
    /// block until the server answers.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat_id.as_ref()
    }

    pub fn bot_token(&self) -> Option<&str> {
        self.bot_token.as_deref()
    }

    pub fn substitution_max_length(&self) -> usize {
        self.substitution_max_length
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse the configured Bot API base url.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| ConfigError::InvalidApiUrl(format!("{}: {}", self.api_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        Ok(url)
    }

    /// Check the config in the order a sink needs it: destination, then credential, then the
    /// length limit and endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.chat_id {
            Some(id) if !id.is_blank() => {}
            _ => return Err(ConfigError::MissingDestination),
        }
        match &self.bot_token {
            Some(token) if !token.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingCredential),
        }
        if self.substitution_max_length == 0 {
            return Err(ConfigError::InvalidMaxLength);
        }
        self.api_url().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_applies_defaults() {
        let config: SinkConfig =
            serde_json::from_str(r#"{"chat_id": "@ops", "bot_token": "123456:abcde"}"#).unwrap();

        assert_eq!(config.chat_id(), Some(&ChatId::Handle("@ops".to_owned())));
        assert_eq!(config.bot_token(), Some("123456:abcde"));
        assert_eq!(config.substitution_max_length(), DEFAULT_MAX_LENGTH);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.api_url().unwrap().as_str(), "https://api.telegram.org/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialize_numeric_chat_id() {
        let config: SinkConfig = serde_json::from_str(
            r#"{"chat_id": -1001234567890, "bot_token": "t", "substitution_max_length": 100, "timeout_ms": null}"#,
        )
        .unwrap();

        assert_eq!(config.chat_id(), Some(&ChatId::Id(-1001234567890)));
        assert_eq!(config.substitution_max_length(), 100);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn sub_second_timeouts_are_kept() {
        let config = SinkConfig::new("@ops", "t").with_timeout(Some(Duration::from_millis(250)));
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));

        let config = SinkConfig::new("@ops", "t").with_timeout(Some(Duration::ZERO));
        assert_eq!(config.timeout(), Some(Duration::ZERO));

        let config: SinkConfig =
            serde_json::from_str(r#"{"chat_id": "@ops", "timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn missing_destination_wins_regardless_of_token() {
        let no_token: SinkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(no_token.validate(), Err(ConfigError::MissingDestination));

        let with_token: SinkConfig = serde_json::from_str(r#"{"bot_token": "t"}"#).unwrap();
        assert_eq!(with_token.validate(), Err(ConfigError::MissingDestination));

        let blank = SinkConfig::new("  ", "t");
        assert_eq!(blank.validate(), Err(ConfigError::MissingDestination));
    }

    #[test]
    fn missing_credential() {
        let unset: SinkConfig = serde_json::from_str(r#"{"chat_id": 42}"#).unwrap();
        assert_eq!(unset.validate(), Err(ConfigError::MissingCredential));

        let empty = SinkConfig::new(42_i64, "");
        assert_eq!(empty.validate(), Err(ConfigError::MissingCredential));
    }

    #[test]
    fn zero_max_length_is_rejected() {
        let config = SinkConfig::new(42_i64, "t").with_max_length(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxLength));
    }

    #[test]
    fn bad_api_url_is_rejected() {
        let config = SinkConfig::new(42_i64, "t").with_api_url("not a url");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidApiUrl(_))));

        let config = SinkConfig::new(42_i64, "t").with_api_url("mailto:ops@example.com");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidApiUrl(_))));
    }

    #[test]
    fn debug_redacts_token() {
        let config = SinkConfig::new("@ops", "123456:secret-token");
        let out = format!("{:?}", config);
        assert!(!out.contains("secret-token"));
        assert!(out.contains("[REDACTED]"));
        assert!(out.contains("@ops"));
    }
}
