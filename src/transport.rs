/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use crate::config::{ChatId, SinkConfig};
use crate::error::{ConfigError, TransportError};
use derivative::Derivative;
use log::trace;
#[cfg(feature = "tls")]
use rustls::ClientConfig;
use serde::{Deserialize, Serialize};
use serde_json::to_vec;
#[cfg(feature = "tls")]
use std::sync::Arc;
use ureq::{AgentBuilder, Error, Request};

/// `Transport` delivers one text message to one chat. `Sink` calls it exactly once per export.
/// Implementations block until the remote side acknowledged or rejected the message.
pub trait Transport: Send + Sync {
    fn send(&self, destination: &ChatId, text: &str) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ReplyParameters>,
}

#[derive(Deserialize)]
struct ReplyParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// `TelegramTransport` posts to the Bot API `sendMessage` method with ureq. The token is part
/// of the request path, so it is scrubbed from every error message this type produces.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TelegramTransport {
    #[derivative(Debug = "ignore")]
    request: Request,
    #[derivative(Debug = "ignore")]
    bot_token: String,
}

impl TelegramTransport {
    /// Build a client for the token and endpoint in `config`.
    pub fn new(config: &SinkConfig) -> Result<TelegramTransport, ConfigError> {
        #[cfg(feature = "tls")]
        return Self::build(config, None);
        #[cfg(not(feature = "tls"))]
        Self::build(config)
    }

    #[cfg(feature = "tls")]
    /// Like `new`, but with a custom rustls configuration. Passed directly to ureq.
    pub fn with_tls_config(
        config: &SinkConfig,
        tls_config: Arc<ClientConfig>,
    ) -> Result<TelegramTransport, ConfigError> {
        Self::build(config, Some(tls_config))
    }

    fn build(
        config: &SinkConfig,
        #[cfg(feature = "tls")] tls_config: Option<Arc<ClientConfig>>,
    ) -> Result<TelegramTransport, ConfigError> {
        let bot_token = match config.bot_token() {
            Some(t) if !t.trim().is_empty() => t.to_owned(),
            _ => return Err(ConfigError::MissingCredential),
        };

        let mut endpoint = config.api_url()?;
        let base = endpoint.to_string();
        endpoint
            .path_segments_mut()
            .map_err(|_| ConfigError::InvalidApiUrl(base))?
            .pop_if_empty()
            .push(&format!("bot{}", bot_token))
            .push("sendMessage");

        let mut agent_builder = AgentBuilder::new();
        if let Some(timeout) = config.timeout() {
            agent_builder = agent_builder.timeout(timeout);
        }

        #[cfg(feature = "tls")]
        if let Some(tls_config) = tls_config {
            agent_builder = agent_builder.tls_config(tls_config);
        }

        let agent = agent_builder.build();
        let request = agent
            .request_url("POST", &endpoint)
            .set("Content-Type", "application/json; charset=utf-8");

        Ok(TelegramTransport { request, bot_token })
    }

    fn scrub(&self, msg: String) -> String {
        msg.replace(&self.bot_token, "[REDACTED]")
    }
}

impl Transport for TelegramTransport {
    fn send(&self, destination: &ChatId, text: &str) -> Result<(), TransportError> {
        let body = to_vec(&SendMessage {
            chat_id: destination,
            text,
        })
        .map_err(|e| TransportError::PayloadRejected(e.to_string()))?;

        trace!("posting {} bytes to chat {}", body.len(), destination);

        match self.request.clone().send_bytes(&body) {
            Ok(resp) => {
                let status = resp.status();
                let raw = resp
                    .into_string()
                    .map_err(|e| TransportError::Network(self.scrub(e.to_string())))?;
                let reply: ApiReply = serde_json::from_str(&raw)
                    .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
                if reply.ok {
                    Ok(())
                } else {
                    Err(TransportError::InvalidResponse(format!(
                        "HTTP {} with ok=false: {}",
                        status,
                        reply.description.unwrap_or_default()
                    )))
                }
            }
            Err(Error::Status(code, resp)) => {
                let status_text = resp.status_text().to_owned();
                let reply = resp
                    .into_string()
                    .ok()
                    .and_then(|raw| serde_json::from_str::<ApiReply>(&raw).ok());
                let (description, retry_after) = match reply {
                    Some(r) => (
                        r.description.unwrap_or(status_text),
                        r.parameters.and_then(|p| p.retry_after),
                    ),
                    None => (status_text, None),
                };
                Err(classify(code, self.scrub(description), retry_after))
            }
            Err(e) => Err(TransportError::Network(self.scrub(e.to_string()))),
        }
    }
}

// Map a rejected sendMessage call onto the failure taxonomy.
fn classify(status: u16, description: String, retry_after: Option<u64>) -> TransportError {
    let lower = description.to_lowercase();
    match status {
        401 | 404 => TransportError::Unauthorized(description),
        429 => TransportError::RateLimited {
            retry_after,
            description,
        },
        413 => TransportError::PayloadRejected(description),
        400 if lower.contains("too long") || lower.contains("text is empty") => {
            TransportError::PayloadRejected(description)
        }
        400 if lower.contains("chat") || lower.contains("user") => {
            TransportError::InvalidDestination(description)
        }
        403 => TransportError::InvalidDestination(description),
        400 => TransportError::PayloadRejected(description),
        _ => TransportError::Http {
            status,
            description,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_auth_failures() {
        assert_eq!(
            classify(401, "Unauthorized".to_owned(), None),
            TransportError::Unauthorized("Unauthorized".to_owned())
        );
        assert_eq!(
            classify(404, "Not Found".to_owned(), None),
            TransportError::Unauthorized("Not Found".to_owned())
        );
    }

    #[test]
    fn classify_destination_failures() {
        assert_eq!(
            classify(400, "Bad Request: chat not found".to_owned(), None),
            TransportError::InvalidDestination("Bad Request: chat not found".to_owned())
        );
        assert_eq!(
            classify(403, "Forbidden: bot was blocked by the user".to_owned(), None),
            TransportError::InvalidDestination("Forbidden: bot was blocked by the user".to_owned())
        );
    }

    #[test]
    fn classify_payload_failures() {
        assert_eq!(
            classify(400, "Bad Request: message is too long".to_owned(), None),
            TransportError::PayloadRejected("Bad Request: message is too long".to_owned())
        );
        assert_eq!(
            classify(413, "Request Entity Too Large".to_owned(), None),
            TransportError::PayloadRejected("Request Entity Too Large".to_owned())
        );
    }

    #[test]
    fn classify_rate_limit_and_server_errors() {
        assert_eq!(
            classify(429, "Too Many Requests: retry after 7".to_owned(), Some(7)),
            TransportError::RateLimited {
                retry_after: Some(7),
                description: "Too Many Requests: retry after 7".to_owned(),
            }
        );
        assert_eq!(
            classify(502, "Bad Gateway".to_owned(), None),
            TransportError::Http {
                status: 502,
                description: "Bad Gateway".to_owned(),
            }
        );
    }

    #[test]
    fn payload_serializes_chat_id_by_kind() {
        let numeric = to_vec(&SendMessage {
            chat_id: &ChatId::Id(-100123),
            text: "hi",
        })
        .unwrap();
        assert_eq!(numeric, br#"{"chat_id":-100123,"text":"hi"}"#.to_vec());

        let handle = to_vec(&SendMessage {
            chat_id: &ChatId::Handle("@ops".to_owned()),
            text: "hi",
        })
        .unwrap();
        assert_eq!(handle, br#"{"chat_id":"@ops","text":"hi"}"#.to_vec());
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let config: SinkConfig = serde_json::from_str(r#"{"chat_id": 1}"#).unwrap();
        assert_eq!(
            TelegramTransport::new(&config).unwrap_err(),
            ConfigError::MissingCredential
        );
    }
}
