/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use crate::record::LogRecord;
use crate::text::TextFormatter;

/// Separator placed between two rendered records in an outbound message.
pub const RECORD_SEPARATOR: &str = "\n\n";

/// `RecordFormatter` implementations render a single log record to a string. This trait can be
/// implemented to customize how each record looks in the Telegram message. By default, the
/// `TextFormatter` is used.
pub trait RecordFormatter: Send + Sync {
    fn write_record(&self, dst: &mut String, rec: &LogRecord) -> std::fmt::Result;
}

/// `MessageFormatter` turns a batch of records into the body of one message: every record is
/// rendered by the wrapped `RecordFormatter` and consecutive blocks are joined by a blank line.
pub struct MessageFormatter {
    record_fmt: Box<dyn RecordFormatter>,
}

impl MessageFormatter {
    pub fn new(record_fmt: Box<dyn RecordFormatter>) -> Self {
        MessageFormatter { record_fmt }
    }

    /// Render the whole batch. An empty batch yields an empty string.
    ///
    /// This never fails: if the record formatter errors, that record falls back to its bare
    /// message text.
    pub fn format(&self, batch: &[LogRecord]) -> String {
        let mut out = String::new();
        for (i, rec) in batch.iter().enumerate() {
            if i > 0 {
                out.push_str(RECORD_SEPARATOR);
            }

            let mut block = String::new();
            if self.record_fmt.write_record(&mut block, rec).is_err() {
                block.clear();
                block.push_str(rec.message());
            }
            out.push_str(&block);
        }
        out
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        MessageFormatter::new(Box::new(TextFormatter::default()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use log::Level;
    use std::fmt::Write;

    /// Renders `LEVEL: message`, enough to see the join policy in isolation.
    pub(crate) struct LevelMessage;

    impl RecordFormatter for LevelMessage {
        fn write_record(&self, dst: &mut String, rec: &LogRecord) -> std::fmt::Result {
            write!(dst, "{}: {}", rec.level(), rec.message())
        }
    }

    struct Failing;

    impl RecordFormatter for Failing {
        fn write_record(&self, dst: &mut String, _rec: &LogRecord) -> std::fmt::Result {
            dst.push_str("partial");
            Err(std::fmt::Error)
        }
    }

    fn formatter() -> MessageFormatter {
        MessageFormatter::new(Box::new(LevelMessage))
    }

    #[test]
    fn empty_batch_is_empty_string() {
        assert_eq!(formatter().format(&[]), "");
    }

    #[test]
    fn single_record_has_no_separator() {
        let batch = vec![LogRecord::new(Level::Error, "app", "disk full")];
        assert_eq!(formatter().format(&batch), "ERROR: disk full");
    }

    #[test]
    fn records_are_joined_by_blank_lines() {
        let batch = vec![
            LogRecord::new(Level::Error, "app", "disk full"),
            LogRecord::new(Level::Warn, "app", "low memory"),
            LogRecord::new(Level::Info, "app", "retrying"),
        ];
        let text = formatter().format(&batch);

        assert_eq!(text, "ERROR: disk full\n\nWARN: low memory\n\nINFO: retrying");
        assert_eq!(text.matches(RECORD_SEPARATOR).count(), batch.len() - 1);

        let blocks: Vec<&str> = text.split(RECORD_SEPARATOR).collect();
        for (block, rec) in blocks.iter().zip(&batch) {
            let mut single = String::new();
            LevelMessage.write_record(&mut single, rec).unwrap();
            assert_eq!(*block, single);
        }
    }

    #[test]
    fn failing_record_formatter_falls_back_to_message() {
        let fmt = MessageFormatter::new(Box::new(Failing));
        let batch = vec![
            LogRecord::new(Level::Error, "app", "first"),
            LogRecord::new(Level::Error, "app", "second"),
        ];
        assert_eq!(fmt.format(&batch), "first\n\nsecond");
    }
}
