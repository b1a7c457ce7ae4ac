//! # blectl-core
//!
//! Shared library for blectl containing the command payload model, the
//! payload store with its result history, the command validator/mutator,
//! and the flat command string encoder.
//!
//! This crate is used by the console application. It has zero dependencies
//! on OS APIs, the Bluetooth stack, or any UI framework.
//!
//! # Architecture overview
//!
//! blectl drives a BLE peripheral that accepts flat textual commands such as
//! `SET_ID:42`. The state those commands describe lives locally as a single
//! *payload record*: an action plus a small user record (id, name, status,
//! device model, timestamp). This crate defines:
//!
//! - **`domain`** – The payload record with its per-field length bounds and
//!   defaults, and the [`PayloadStore`] that owns the one live record plus a
//!   bounded history of command results.
//!
//! - **`command`** – The [`CommandManager`] that validates and applies each
//!   payload operation (recording every outcome, success or failure, to the
//!   history), and the encoder that turns a command name and optional value
//!   into the string sent over the radio link.

// Declare the two top-level modules. Rust will look for each in a
// subdirectory with the same name (e.g., src/domain/mod.rs).
pub mod command;
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `blectl_core::CommandManager` instead of the full module path.
pub use command::encoder::generate_command_string;
pub use command::manager::{CommandError, CommandManager};
pub use domain::payload::{PayloadField, PayloadRecord, UserRecord};
pub use domain::store::{CommandResult, PayloadStore, HISTORY_CAPACITY};
