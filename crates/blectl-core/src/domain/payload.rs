//! The command payload data model.
//!
//! A [`PayloadRecord`] is the local image of the command state a peripheral
//! consumes: one `action` verb plus a [`UserRecord`]. Every field is a
//! bounded string; the bounds exist because the peripheral receives these
//! values inside flat `NAME:value` command strings with a fixed receive
//! buffer. [`PayloadField`] names each bounded field so validation errors
//! can report which bound was violated.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default `action` verb for a freshly created record.
pub const DEFAULT_ACTION: &str = "add";
/// Default user id.
pub const DEFAULT_USER_ID: &str = "1";
/// Default user display name.
pub const DEFAULT_USER_NAME: &str = "DefaultUser";
/// Default user status.
pub const DEFAULT_USER_STATUS: &str = "online";
/// Default device model string.
pub const DEFAULT_USER_DEVICE: &str = "ESP32-S3";

/// Returns the current time as an RFC 3339 string with seconds precision,
/// e.g. `2026-08-05T12:34:56Z`.
///
/// Seconds precision keeps the string well inside the 30-character bound of
/// [`PayloadField::UserTimestamp`].
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ── Bounded fields ────────────────────────────────────────────────────────────

/// The bounded string fields of a [`PayloadRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadField {
    Action,
    UserId,
    UserName,
    UserStatus,
    UserDevice,
    UserTimestamp,
}

impl PayloadField {
    /// Maximum length of this field in characters.
    pub const fn limit(self) -> usize {
        match self {
            PayloadField::Action => 20,
            PayloadField::UserId => 20,
            PayloadField::UserName => 50,
            PayloadField::UserStatus => 20,
            PayloadField::UserDevice => 30,
            PayloadField::UserTimestamp => 30,
        }
    }

    /// Display name used in validation messages.
    pub const fn name(self) -> &'static str {
        match self {
            PayloadField::Action => "Action",
            PayloadField::UserId => "User ID",
            PayloadField::UserName => "User name",
            PayloadField::UserStatus => "Status",
            PayloadField::UserDevice => "Device model",
            PayloadField::UserTimestamp => "Timestamp",
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// The user portion of a payload record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User identifier (max 20 characters).
    pub id: String,
    /// Display name (max 50 characters).
    pub name: String,
    /// Status string, e.g. `online` (max 20 characters).
    pub status: String,
    /// Device model string (max 30 characters).
    pub device: String,
    /// Timestamp string; bounded at 30 characters, format otherwise free.
    pub timestamp: String,
}

/// The command payload: one action verb plus a user record.
///
/// Exactly one record is live at a time; it is owned by
/// [`crate::domain::store::PayloadStore`] and mutated only through the
/// validated operations of [`crate::command::manager::CommandManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub action: String,
    pub user: UserRecord,
}

impl PayloadRecord {
    /// Builds the documented default record with a fresh timestamp.
    pub fn with_defaults() -> Self {
        Self {
            action: DEFAULT_ACTION.to_string(),
            user: UserRecord {
                id: DEFAULT_USER_ID.to_string(),
                name: DEFAULT_USER_NAME.to_string(),
                status: DEFAULT_USER_STATUS.to_string(),
                device: DEFAULT_USER_DEVICE.to_string(),
                timestamp: now_timestamp(),
            },
        }
    }
}

impl Default for PayloadRecord {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
