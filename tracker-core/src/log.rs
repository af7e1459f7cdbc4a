//! Narrative event log.
//!
//! User-visible messages ("Goblin 2 revealed in player view.") are kept on
//! the encounter and forwarded to an optional external [`LogSink`].

use serde::{Deserialize, Serialize};

/// Receives narrative log messages.
pub trait LogSink {
    fn log(&mut self, message: &str);
}

impl<F: FnMut(&str)> LogSink for F {
    fn log(&mut self, message: &str) {
        self(message)
    }
}

/// A logged narrative event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Round the event happened in; 0 before the encounter starts.
    pub round: u32,
    pub message: String,
}
