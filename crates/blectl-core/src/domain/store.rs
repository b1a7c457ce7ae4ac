//! The payload store: one live record plus the command result history.
//!
//! The store holds state and nothing else. Validation lives in
//! [`crate::command::manager::CommandManager`]; the store trusts whatever
//! record it is handed. All mutations are synchronous and immediately
//! visible to subsequent reads. The store is never shared across threads
//! directly; the console wraps it (via the manager) in an async mutex.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::domain::payload::{now_timestamp, PayloadRecord};

/// Maximum number of retained history entries. Recording the 51st result
/// evicts the oldest.
pub const HISTORY_CAPACITY: usize = 50;

// ── Command results ───────────────────────────────────────────────────────────

/// Outcome of one payload command invocation.
///
/// Every command, success or failure, produces exactly one of these and the
/// store keeps the most recent [`HISTORY_CAPACITY`] as an audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// `true` if the command was applied.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// Snapshot of the payload after the operation; absent on failure.
    pub data: Option<PayloadRecord>,
    /// Creation time of this result (RFC 3339, seconds precision).
    pub timestamp: String,
}

impl CommandResult {
    /// Constructs a success result carrying the updated record.
    pub fn ok(message: impl Into<String>, data: PayloadRecord) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: now_timestamp(),
        }
    }

    /// Constructs a failure result. Failures never carry a record snapshot.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            timestamp: now_timestamp(),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Owns the single live [`PayloadRecord`] and the bounded result history.
///
/// Reads return clones; callers never mutate the stored record directly.
#[derive(Debug)]
pub struct PayloadStore {
    current: PayloadRecord,
    history: VecDeque<CommandResult>,
}

impl PayloadStore {
    /// Creates a store holding the default record and an empty history.
    pub fn new() -> Self {
        Self {
            current: PayloadRecord::with_defaults(),
            history: VecDeque::new(),
        }
    }

    /// Returns a copy of the current record.
    pub fn current(&self) -> PayloadRecord {
        self.current.clone()
    }

    /// Replaces the current record wholesale.
    pub fn replace(&mut self, record: PayloadRecord) {
        self.current = record;
    }

    /// Prepends `result` to the history, evicting the oldest entry once the
    /// history exceeds [`HISTORY_CAPACITY`].
    pub fn record(&mut self, result: CommandResult) {
        self.history.push_front(result);
        self.history.truncate(HISTORY_CAPACITY);
    }

    /// Returns the history, newest first.
    pub fn history(&self) -> Vec<CommandResult> {
        self.history.iter().cloned().collect()
    }

    /// Number of retained history entries.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Discards the entire history. The current record is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Default for PayloadStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
