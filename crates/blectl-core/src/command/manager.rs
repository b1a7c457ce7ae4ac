//! CommandManager: validates and applies payload commands.
//!
//! The manager sits between the presentation layer and the
//! [`PayloadStore`]. Each operation validates its input, mutates the store
//! on success, and returns a [`CommandResult`] describing the outcome. The
//! result is also recorded to the store's history whether the operation
//! succeeded or not; the history is an audit log of attempts, not of state
//! changes.
//!
//! Validation failures are never returned as `Err` to callers. They are
//! folded into the failure [`CommandResult`], so the presentation layer has
//! a single rendering path for both outcomes.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::payload::{
    now_timestamp, PayloadField, PayloadRecord, UserRecord, DEFAULT_USER_DEVICE, DEFAULT_USER_ID,
    DEFAULT_USER_NAME, DEFAULT_USER_STATUS,
};
use crate::domain::store::{CommandResult, PayloadStore};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Validation failures for payload commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The whole-record replace input was not a JSON document of the
    /// expected shape.
    #[error("Invalid JSON payload: {0}")]
    MalformedPayload(String),

    /// The whole-record replace input parsed but lacks a required field.
    #[error("Invalid payload structure: missing '{0}' field")]
    MissingField(&'static str),

    /// A field value exceeds its documented bound.
    #[error("{} too long (max {} chars)", .0.name(), .0.limit())]
    FieldTooLong(PayloadField),
}

/// Checks one field value against its length bound.
fn check_field(field: PayloadField, value: &str) -> Result<(), CommandError> {
    if value.chars().count() > field.limit() {
        return Err(CommandError::FieldTooLong(field));
    }
    Ok(())
}

// ── Partial parse types ───────────────────────────────────────────────────────

// The whole-record replace input is parsed into these optional-field shapes
// first; presence and length validation runs on the parsed value. Input that
// does not fit this shape (wrong types, non-object user) fails the parse and
// is reported as `MalformedPayload` before any field is examined.

#[derive(Debug, Deserialize)]
struct PartialUser {
    id: Option<String>,
    name: Option<String>,
    status: Option<String>,
    device: Option<String>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PartialPayload {
    action: Option<String>,
    user: Option<PartialUser>,
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// Validates and applies payload commands against an owned [`PayloadStore`].
#[derive(Debug, Default)]
pub struct CommandManager {
    store: PayloadStore,
}

impl CommandManager {
    /// Creates a manager over a fresh store holding the default record.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Non-recording reads ──────────────────────────────────────────────────

    /// Returns the current record without recording a history entry.
    ///
    /// This is the read used for rendering state; the `GET_PAYLOAD` command
    /// is [`Self::get_payload`], which does record.
    pub fn payload(&self) -> PayloadRecord {
        self.store.current()
    }

    /// Returns the command history, newest first.
    pub fn history(&self) -> Vec<CommandResult> {
        self.store.history()
    }

    /// Discards the command history.
    pub fn clear_history(&mut self) {
        self.store.clear_history();
    }

    // ── Field setters ────────────────────────────────────────────────────────

    /// Sets `user.id` (max 20 characters).
    pub fn set_id(&mut self, value: &str) -> CommandResult {
        self.apply_field(PayloadField::UserId, value)
    }

    /// Sets `user.name` (max 50 characters).
    pub fn set_name(&mut self, value: &str) -> CommandResult {
        self.apply_field(PayloadField::UserName, value)
    }

    /// Sets `user.status` (max 20 characters).
    pub fn set_status(&mut self, value: &str) -> CommandResult {
        self.apply_field(PayloadField::UserStatus, value)
    }

    /// Sets `user.device` (max 30 characters).
    pub fn set_device(&mut self, value: &str) -> CommandResult {
        self.apply_field(PayloadField::UserDevice, value)
    }

    /// Sets `action` (max 20 characters).
    pub fn set_action(&mut self, value: &str) -> CommandResult {
        self.apply_field(PayloadField::Action, value)
    }

    /// Sets `user.timestamp` (max 30 characters, format not validated).
    pub fn set_timestamp(&mut self, value: &str) -> CommandResult {
        self.apply_field(PayloadField::UserTimestamp, value)
    }

    // ── Whole-record operations ──────────────────────────────────────────────

    /// Replaces the whole record from a JSON document.
    ///
    /// Validation order: parse, then presence of `action` and `user`, then
    /// per-field length bounds. Optional fields absent from the document
    /// take their defaults (timestamp takes the current time). On any
    /// failure the stored record is left untouched.
    pub fn set_payload(&mut self, json: &str) -> CommandResult {
        match parse_and_validate(json) {
            Ok(record) => {
                self.store.replace(record);
                self.succeed("Payload updated successfully")
            }
            Err(e) => self.fail(e),
        }
    }

    /// Restores the default record with a fresh timestamp. Always succeeds.
    pub fn reset_payload(&mut self) -> CommandResult {
        self.store.replace(PayloadRecord::with_defaults());
        self.succeed("Payload reset to default")
    }

    /// Returns the current record as a recorded command. Never mutates the
    /// record and always succeeds.
    pub fn get_payload(&mut self) -> CommandResult {
        self.succeed("Current payload retrieved")
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn apply_field(&mut self, field: PayloadField, value: &str) -> CommandResult {
        if let Err(e) = check_field(field, value) {
            return self.fail(e);
        }

        let mut record = self.store.current();
        match field {
            PayloadField::Action => record.action = value.to_string(),
            PayloadField::UserId => record.user.id = value.to_string(),
            PayloadField::UserName => record.user.name = value.to_string(),
            PayloadField::UserStatus => record.user.status = value.to_string(),
            PayloadField::UserDevice => record.user.device = value.to_string(),
            PayloadField::UserTimestamp => record.user.timestamp = value.to_string(),
        }
        self.store.replace(record);

        self.succeed(format!("{} set to: {value}", field.name()))
    }

    fn succeed(&mut self, message: impl Into<String>) -> CommandResult {
        let result = CommandResult::ok(message, self.store.current());
        self.store.record(result.clone());
        debug!(outcome = %result.message, "payload command applied");
        result
    }

    fn fail(&mut self, error: CommandError) -> CommandResult {
        let result = CommandResult::err(error.to_string());
        self.store.record(result.clone());
        debug!(outcome = %result.message, "payload command rejected");
        result
    }
}

/// Parses and validates a whole-record replace document.
fn parse_and_validate(json: &str) -> Result<PayloadRecord, CommandError> {
    let partial: PartialPayload =
        serde_json::from_str(json).map_err(|e| CommandError::MalformedPayload(e.to_string()))?;

    let action = partial.action.ok_or(CommandError::MissingField("action"))?;
    let user = partial.user.ok_or(CommandError::MissingField("user"))?;

    check_field(PayloadField::Action, &action)?;
    if let Some(id) = &user.id {
        check_field(PayloadField::UserId, id)?;
    }
    if let Some(name) = &user.name {
        check_field(PayloadField::UserName, name)?;
    }
    if let Some(status) = &user.status {
        check_field(PayloadField::UserStatus, status)?;
    }
    if let Some(device) = &user.device {
        check_field(PayloadField::UserDevice, device)?;
    }
    if let Some(timestamp) = &user.timestamp {
        check_field(PayloadField::UserTimestamp, timestamp)?;
    }

    Ok(PayloadRecord {
        action,
        user: UserRecord {
            id: user.id.unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            name: user.name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            status: user.status.unwrap_or_else(|| DEFAULT_USER_STATUS.to_string()),
            device: user.device.unwrap_or_else(|| DEFAULT_USER_DEVICE.to_string()),
            timestamp: user.timestamp.unwrap_or_else(now_timestamp),
        },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
