/*
Copyright (C) 2026 The log_telegram Authors

This Source Code Form is subject to the terms of the Mozilla Public
License, v. 2.0. If a copy of the MPL was not distributed with this
file, You can obtain one at http://mozilla.org/MPL/2.0/.
*/

use crate::record::{Batch, LogRecord};
use std::sync::{Mutex, MutexGuard};

/// `LogBufferSource` is whatever accumulates records between flushes. On each flush the sink
/// asks it for the records gathered so far, in the order they were logged.
pub trait LogBufferSource {
    fn produce(&self) -> Batch;
}

/// `MemoryBuffer` is a simple in-memory `LogBufferSource`. `produce` drains it.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    records: Mutex<Batch>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        MemoryBuffer::default()
    }

    // A panic while holding the lock must not take logging down with it.
    fn lock(&self) -> MutexGuard<'_, Batch> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a record and return how many records are now buffered.
    pub fn push(&self, rec: LogRecord) -> usize {
        let mut records = self.lock();
        records.push(rec);
        records.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl LogBufferSource for MemoryBuffer {
    fn produce(&self) -> Batch {
        std::mem::take(&mut *self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn produce_drains_in_order() {
        let buf = MemoryBuffer::new();
        assert_eq!(buf.push(LogRecord::new(Level::Error, "app", "first")), 1);
        assert_eq!(buf.push(LogRecord::new(Level::Warn, "app", "second")), 2);

        let batch = buf.produce();
        let messages: Vec<&str> = batch.iter().map(|r| r.message()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert!(buf.is_empty());
        assert!(buf.produce().is_empty());
    }
}
