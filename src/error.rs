/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use thiserror::Error;

/// Startup errors. A sink that fails to initialize should stop the host from accepting log
/// traffic through it; these are not meant to be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chat_id must be set")]
    MissingDestination,
    #[error("bot_token must be set")]
    MissingCredential,
    #[error("substitution_max_length must be greater than zero")]
    InvalidMaxLength,
    #[error("invalid Bot API url: {0}")]
    InvalidApiUrl(String),
}

/// Failures reported by a `Transport` for a single send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never got an HTTP response (DNS, connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),
    #[error("bot token rejected: {0}")]
    Unauthorized(String),
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
    #[error("rate limited: {description}")]
    RateLimited {
        /// Seconds the Bot API asked us to wait, when it said so.
        retry_after: Option<u64>,
        description: String,
    },
    #[error("payload rejected: {0}")]
    PayloadRejected(String),
    /// Any other non-success status, 5xx included.
    #[error("HTTP {status}: {description}")]
    Http { status: u16, description: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Per-call delivery failure returned from `Sink::export`. Nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport failure: {0}")]
    TransportFailure(#[from] TransportError),
}
