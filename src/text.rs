/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use crate::fmt::RecordFormatter;
use crate::record::LogRecord;
use bitflags::bitflags;
use log::Level;
use std::fmt::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Indentation for the location and trace lines under a message
const DETAIL_INDENT: &str = "    ";

/// `TextFormatter` renders a record as one human readable block, for example:
///
/// ```text
/// 2024-03-01 12:00:00 [error][app::db] connection refused
///     in src/db.rs:42
/// ```
///
/// What goes into the header is controlled by `TextFields`. A stack trace attached to the record
/// is always written below the message, one indented line per trace line.
#[derive(Default, Debug)]
pub struct TextFormatter {
    include_fields: TextFields,
}

impl TextFormatter {
    pub fn new(include_fields: TextFields) -> Self {
        TextFormatter { include_fields }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

impl RecordFormatter for TextFormatter {
    fn write_record(&self, dst: &mut String, rec: &LogRecord) -> std::fmt::Result {
        let start = dst.len();

        if self.include_fields.contains(TextFields::TIMESTAMP) {
            write!(dst, "{} ", rec.timestamp().format(TIMESTAMP_FORMAT))?;
        }

        if self.include_fields.contains(TextFields::LEVEL) {
            write!(dst, "[{}]", level_name(rec.level()))?;
        }

        if self.include_fields.contains(TextFields::CATEGORY) && !rec.category().is_empty() {
            write!(dst, "[{}]", rec.category())?;
        }

        if self.include_fields.contains(TextFields::MODULE_PATH) {
            if let Some(m) = rec.module_path() {
                write!(dst, "[{}]", m)?;
            }
        }

        if dst.len() > start && dst.ends_with(']') {
            dst.push(' ');
        }
        dst.push_str(rec.message());

        if self.include_fields.contains(TextFields::LOCATION) {
            match (rec.file(), rec.line()) {
                (Some(f), Some(l)) => write!(dst, "\n{}in {}:{}", DETAIL_INDENT, f, l)?,
                (Some(f), None) => write!(dst, "\n{}in {}", DETAIL_INDENT, f)?,
                _ => {}
            }
        }

        if let Some(trace) = rec.trace() {
            for line in trace.lines().filter(|l| !l.trim().is_empty()) {
                write!(dst, "\n{}{}", DETAIL_INDENT, line.trim_end())?;
            }
        }

        Ok(())
    }
}

bitflags! {
    /// `TextFields` selects which parts of a record the `TextFormatter` writes around the message.
    /// The default set is TIMESTAMP | LEVEL | CATEGORY | LOCATION
    pub struct TextFields: u32 {
        /// Prefix the block with the record's UTC timestamp.
        const TIMESTAMP = 1;
        /// Include the level, e.g. `[error]`.
        const LEVEL = 1 << 1;
        /// Include the category (the `log` target), e.g. `[app::db]`.
        const CATEGORY = 1 << 2;
        /// Include the module path the record was logged from.
        const MODULE_PATH = 1 << 3;
        /// Write the source file and line on their own line below the message.
        const LOCATION = 1 << 4;
    }
}

impl Default for TextFields {
    fn default() -> Self {
        TextFields::TIMESTAMP | TextFields::LEVEL | TextFields::CATEGORY | TextFields::LOCATION
    }
}
