//! Flat command string encoder.
//!
//! The peripheral consumes textual commands of the form `NAME` or
//! `NAME:value`. This module is the single place that knows which command
//! names carry a value. Encoding is pure and stateless; transmission is the
//! caller's concern.

// ── Command names ─────────────────────────────────────────────────────────────

/// Replace the whole payload record (value: JSON document).
pub const SET_PAYLOAD: &str = "SET_PAYLOAD";
/// Read back the current payload record.
pub const GET_PAYLOAD: &str = "GET_PAYLOAD";
/// Restore the default payload record.
pub const RESET_PAYLOAD: &str = "RESET_PAYLOAD";
/// Set the user id field.
pub const SET_ID: &str = "SET_ID";
/// Set the user name field.
pub const SET_NAME: &str = "SET_NAME";
/// Set the user status field.
pub const SET_STATUS: &str = "SET_STATUS";
/// Set the device model field.
pub const SET_DEVICE: &str = "SET_DEVICE";
/// Set the action verb.
pub const SET_ACTION: &str = "SET_ACTION";
/// Set the timestamp field.
pub const SET_TIMESTAMP: &str = "SET_TIMESTAMP";
/// Ask the peripheral to apply the current payload.
pub const SEND_REQUEST: &str = "SEND_REQUEST";
/// Ask the peripheral for its current request state.
pub const GET_REQUEST: &str = "GET_REQUEST";

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes a command name and optional value into the wire string.
///
/// Value-bearing commands render as `NAME:value` (a missing value renders
/// as an empty value). Value-less commands render as the bare name.
/// Unrecognized names pass through unchanged; the peripheral owns the
/// decision of what to do with them.
///
/// # Examples
///
/// ```rust
/// use blectl_core::generate_command_string;
///
/// assert_eq!(generate_command_string("SET_ID", Some("42")), "SET_ID:42");
/// assert_eq!(generate_command_string("GET_PAYLOAD", None), "GET_PAYLOAD");
/// assert_eq!(generate_command_string("UNKNOWN_CMD", None), "UNKNOWN_CMD");
/// ```
pub fn generate_command_string(command: &str, value: Option<&str>) -> String {
    match command {
        SET_PAYLOAD | SET_ID | SET_NAME | SET_STATUS | SET_DEVICE | SET_ACTION
        | SET_TIMESTAMP => {
            format!("{command}:{}", value.unwrap_or_default())
        }
        GET_PAYLOAD | RESET_PAYLOAD | SEND_REQUEST | GET_REQUEST => command.to_string(),
        // Unknown names pass through unchanged.
        _ => command.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
