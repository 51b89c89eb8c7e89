/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use chrono::{DateTime, Utc};
use log::{Level, Record};

/// An ordered sequence of records handed to the sink on a single flush. Insertion order is
/// chronological order.
pub type Batch = Vec<LogRecord>;

/// `LogRecord` is an owned copy of one logged event. Unlike `log::Record`, it can outlive the
/// logging call that produced it, so it can sit in a buffer until the next flush.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    level: Level,
    category: String,
    message: String,
    timestamp: DateTime<Utc>,
    module_path: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    trace: Option<String>,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(level: Level, category: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            category: category.into(),
            message: message.into(),
            timestamp: Utc::now(),
            module_path: None,
            file: None,
            line: None,
            trace: None,
        }
    }

    /// Capture a `log::Record`. The target becomes the category.
    pub fn from_log(rec: &Record) -> Self {
        LogRecord {
            level: rec.level(),
            category: rec.target().to_owned(),
            message: rec.args().to_string(),
            timestamp: Utc::now(),
            module_path: rec
                .module_path()
                .or_else(|| rec.module_path_static())
                .map(str::to_owned),
            file: rec.file().or_else(|| rec.file_static()).map(str::to_owned),
            line: rec.line(),
            trace: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    /// Attach a stack trace, rendered below the message.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}
