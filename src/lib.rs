/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

//! Forward log records to a Telegram chat or channel.
//!
//! The core is [`Sink`]: it turns a batch of [`LogRecord`]s into one message, truncates it to
//! the configured length and sends it with a single Bot API call. Hosts that already buffer
//! their own records can call [`Sink::export`] directly on every flush. For the `log` crate,
//! [`TelegramLogger`] does the buffering and flushes into a sink.
//!
//! ```no_run
//! use log::Log;
//! use log_telegram::{Sink, SinkConfig, TelegramLoggerBuilder};
//!
//! let sink = Sink::initialize(SinkConfig::new("@ops_alerts", "123456:abcde"))
//!     .expect("telegram sink misconfigured");
//! TelegramLoggerBuilder::new(sink)
//!     .level(log::LevelFilter::Error)
//!     .build()
//!     .apply()
//!     .unwrap();
//!
//! log::error!("disk full");
//! log::logger().flush();
//! ```

use log::{set_boxed_logger, set_max_level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::cell::Cell;

mod buffer;
pub use buffer::{LogBufferSource, MemoryBuffer};
mod config;
pub use config::{ChatId, SinkConfig, DEFAULT_API_URL, DEFAULT_MAX_LENGTH};
mod error;
pub use error::{ConfigError, DeliveryError, TransportError};
// Join policy and the single-record formatting seam
mod fmt;
pub use fmt::{MessageFormatter, RecordFormatter, RECORD_SEPARATOR};
mod record;
pub use record::{Batch, LogRecord};
mod sink;
pub use sink::{truncate, Sink, SinkBuilder, TRUNCATION_MARKER};
mod text;
pub use text::{TextFields, TextFormatter};
mod transport;
pub use transport::{TelegramTransport, Transport};

// Records logged by this crate itself are never forwarded.
const OWN_TARGET: &str = "log_telegram";

thread_local! {
    // Set while this thread is inside an export. Anything the HTTP client logs during the send
    // is dropped: it would re-enter the sink and may contain the bot token.
    static EXPORTING: Cell<bool> = Cell::new(false);
}

struct ExportGuard;

impl ExportGuard {
    fn enter() -> Option<ExportGuard> {
        EXPORTING.with(|exporting| {
            if exporting.get() {
                None
            } else {
                exporting.set(true);
                Some(ExportGuard)
            }
        })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        EXPORTING.with(|exporting| exporting.set(false));
    }
}

/// Called with the size of the dropped batch whenever a flush triggered through `log` fails.
pub type FailureHandler = Box<dyn Fn(usize, &DeliveryError) + Send + Sync>;

/// `TelegramLoggerBuilder` is used to construct the `TelegramLogger` object.
#[must_use = "Has no affect unless .build() is called."]
pub struct TelegramLoggerBuilder {
    sink: Sink,
    level_filter: LevelFilter,
    export_interval: usize,
    on_failure: FailureHandler,
}

impl TelegramLoggerBuilder {
    /// Construct a new builder that flushes into `sink`.
    pub fn new(sink: Sink) -> TelegramLoggerBuilder {
        TelegramLoggerBuilder {
            sink,
            level_filter: LevelFilter::Error,
            export_interval: 1000,
            on_failure: Box::new(|count, e| {
                eprintln!(
                    "(Telegram) Failed to deliver batch of {} logs: {}; Dropping...",
                    count, e
                )
            }),
        }
    }

    /// Sets the verbosity of this logger
    pub fn level(mut self, lf: LevelFilter) -> TelegramLoggerBuilder {
        self.level_filter = lf;
        self
    }

    /// Specifies how many records may be buffered before they are exported without waiting
    /// for an explicit flush. Values below 1 are treated as 1.
    pub fn export_interval(mut self, records: usize) -> TelegramLoggerBuilder {
        self.export_interval = records.max(1);
        self
    }

    /// Specifies what happens when a flush fails. The default prints one line to stderr and
    /// drops the batch.
    pub fn on_failure<F>(mut self, handler: F) -> TelegramLoggerBuilder
    where
        F: Fn(usize, &DeliveryError) + Send + Sync + 'static,
    {
        self.on_failure = Box::new(handler);
        self
    }

    pub fn build(self) -> TelegramLogger {
        TelegramLogger {
            sink: self.sink,
            buffer: MemoryBuffer::new(),
            level_filter: self.level_filter,
            export_interval: self.export_interval,
            on_failure: self.on_failure,
        }
    }
}

/// Logger implementation that buffers records and sends them to Telegram on flush. Create one
/// using the `TelegramLoggerBuilder`.
///
/// Flushing happens on the calling thread: `flush()`, and any `log` call that fills the buffer
/// to the export interval, blocks until the Bot API answered.
pub struct TelegramLogger {
    sink: Sink,
    buffer: MemoryBuffer,
    level_filter: LevelFilter,
    export_interval: usize,
    on_failure: FailureHandler,
}

impl TelegramLogger {
    /// Installs the logger as the default logger for the entire program.
    /// Calling this (or any similar function from other libraries) more than once is a bug.
    pub fn apply(self) -> Result<(), SetLoggerError> {
        set_max_level(self.level_filter);
        set_boxed_logger(Box::from(self))
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Number of records waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn export_buffered(&self) {
        let _guard = match ExportGuard::enter() {
            Some(g) => g,
            None => return,
        };
        let batch = self.buffer.produce();
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.sink.export(&batch) {
            (self.on_failure)(batch.len(), &e);
        }
    }
}

impl Log for TelegramLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_filter
            && !metadata.target().starts_with(OWN_TARGET)
            && !EXPORTING.with(Cell::get)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if self.buffer.push(LogRecord::from_log(record)) >= self.export_interval {
            self.export_buffered();
        }
    }

    fn flush(&self) {
        self.export_buffered();
    }
}
