/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use crate::buffer::LogBufferSource;
use crate::config::{ChatId, SinkConfig};
use crate::error::{ConfigError, DeliveryError};
use crate::fmt::{MessageFormatter, RecordFormatter};
use crate::record::LogRecord;
use crate::transport::{TelegramTransport, Transport};
use derivative::Derivative;
use log::debug;
#[cfg(feature = "tls")]
use rustls::ClientConfig;
use std::borrow::Cow;
#[cfg(feature = "tls")]
use std::sync::Arc;

/// Appended to a message that had to be cut short.
pub const TRUNCATION_MARKER: &str = "...";

/// Cut `text` down to at most `max_length` characters. Text that already fits is returned as
/// is. Otherwise the result is a prefix of `text` followed by `TRUNCATION_MARKER`, counted
/// within `max_length`. When the limit cannot even hold the marker, only the first
/// `max_length` characters of the marker are returned.
///
/// The cut ignores record boundaries, so the last record may be split mid-text.
pub fn truncate(text: &str, max_length: usize) -> Cow<'_, str> {
    if text.chars().nth(max_length).is_none() {
        return Cow::Borrowed(text);
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_length <= marker_len {
        return Cow::Owned(TRUNCATION_MARKER.chars().take(max_length).collect());
    }

    let keep = max_length - marker_len;
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut out = String::with_capacity(end + TRUNCATION_MARKER.len());
    out.push_str(&text[..end]);
    out.push_str(TRUNCATION_MARKER);
    Cow::Owned(out)
}

/// `SinkBuilder` is used to construct a `Sink`.
#[must_use = "Has no affect unless .build() is called."]
pub struct SinkBuilder {
    config: SinkConfig,
    formatter: Option<Box<dyn RecordFormatter>>,
    transport: Option<Box<dyn Transport>>,
    #[cfg(feature = "tls")]
    tls_config: Option<Arc<ClientConfig>>,
}

impl SinkBuilder {
    pub fn new(config: SinkConfig) -> SinkBuilder {
        SinkBuilder {
            config,
            formatter: None,
            transport: None,
            #[cfg(feature = "tls")]
            tls_config: None, // if unset, uses default
        }
    }

    /// Render each record with `fmt` instead of the default `TextFormatter`.
    pub fn formatter(mut self, fmt: Box<dyn RecordFormatter>) -> SinkBuilder {
        self.formatter = Some(fmt);
        self
    }

    /// Deliver through `transport` instead of the Bot API client built from the config.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> SinkBuilder {
        self.transport = Some(transport);
        self
    }

    #[cfg(feature = "tls")]
    /// Configure rustls for HTTPS requests. Passed directly to ureq.
    pub fn tls_config(mut self, tls_config: Arc<ClientConfig>) -> SinkBuilder {
        self.tls_config = Some(tls_config);
        self
    }

    /// Validate the config and construct the sink. The config is checked even when a custom
    /// transport is supplied.
    pub fn build(self) -> Result<Sink, ConfigError> {
        self.config.validate()?;

        let destination = self
            .config
            .chat_id()
            .cloned()
            .ok_or(ConfigError::MissingDestination)?;

        let transport: Box<dyn Transport> = match self.transport {
            Some(t) => t,
            #[cfg(feature = "tls")]
            None => match self.tls_config {
                Some(tls) => Box::new(TelegramTransport::with_tls_config(&self.config, tls)?),
                None => Box::new(TelegramTransport::new(&self.config)?),
            },
            #[cfg(not(feature = "tls"))]
            None => Box::new(TelegramTransport::new(&self.config)?),
        };

        let formatter = match self.formatter {
            Some(f) => MessageFormatter::new(f),
            None => MessageFormatter::default(),
        };

        Ok(Sink {
            destination,
            max_length: self.config.substitution_max_length(),
            formatter,
            transport,
        })
    }
}

/// `Sink` delivers batches of records to one Telegram chat. A `Sink` only exists once its
/// config has been validated, so every value is ready to export.
///
/// `export` keeps no state between calls and can be shared across threads. Concurrent calls
/// are not ordered against each other; serialize them if message order matters.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Sink {
    destination: ChatId,
    max_length: usize,
    #[derivative(Debug = "ignore")]
    formatter: MessageFormatter,
    #[derivative(Debug = "ignore")]
    transport: Box<dyn Transport>,
}

impl Sink {
    /// Validate `config` and build a sink with the default formatter and Bot API transport.
    pub fn initialize(config: SinkConfig) -> Result<Sink, ConfigError> {
        SinkBuilder::new(config).build()
    }

    pub fn builder(config: SinkConfig) -> SinkBuilder {
        SinkBuilder::new(config)
    }

    pub fn destination(&self) -> &ChatId {
        &self.destination
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Format `batch` into one message, truncate it and send it. Blocks for the duration of the
    /// request. A batch that renders to nothing is not sent.
    pub fn export(&self, batch: &[LogRecord]) -> Result<(), DeliveryError> {
        let text = self.formatter.format(batch);
        if text.is_empty() {
            debug!("batch of {} records rendered empty, not sending", batch.len());
            return Ok(());
        }

        let text = truncate(&text, self.max_length);
        debug!(
            "sending batch of {} records to chat {}",
            batch.len(),
            self.destination
        );

        self.transport
            .send(&self.destination, &text)
            .map_err(|e| {
                debug!("delivery to chat {} failed: {}", self.destination, e);
                DeliveryError::from(e)
            })
    }

    /// Take whatever `source` has buffered and export it.
    pub fn flush(&self, source: &dyn LogBufferSource) -> Result<(), DeliveryError> {
        self.export(&source.produce())
    }
}
