//! Console bridge: shared state, snapshot DTOs, and command functions.
//!
//! Only this module is allowed to reference both the application layer
//! (device registry, command manager) and the presentation layer (the
//! interactive console in `main.rs`). The console never touches the
//! registry or manager directly; it calls the async functions here and
//! renders what they return.
//!
//! # Shared state
//!
//! [`ConsoleAppState`] wraps the registry and the command manager in
//! `tokio::sync::Mutex`es because the command functions are async and hold
//! the lock across platform `.await` points. Holding a `std::sync::Mutex`
//! guard across an await would block the runtime thread; the async mutex
//! suspends the task instead. Since each console action runs to completion
//! before the next line is read, the locks are effectively uncontended;
//! they exist so the same state can be shared with other frontends later.
//!
//! # `ConsoleCommandResult<T>`
//!
//! Device operations return a unified envelope with a `success` flag, an
//! optional value, and an optional error message, so the console has one
//! rendering path for all of them. Payload operations return the
//! [`CommandResult`] audit record from `blectl-core` unchanged.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use blectl_core::command::encoder;
use blectl_core::{generate_command_string, CommandManager, CommandResult};

use crate::application::manage_devices::{DeviceInfo, DeviceRegistry};
use crate::infrastructure::bluetooth::BleCentral;

// ── Shared application state ──────────────────────────────────────────────────

/// Runtime state shared between console commands.
pub struct ConsoleAppState {
    pub registry: Mutex<DeviceRegistry>,
    pub commands: Mutex<CommandManager>,
}

impl ConsoleAppState {
    /// Creates the shared state over the given platform central.
    pub fn new(central: Arc<dyn BleCentral>, scan_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry: Mutex::new(DeviceRegistry::new(central, scan_timeout)),
            commands: Mutex::new(CommandManager::new()),
        })
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Snapshot of the Bluetooth side of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothStatusDto {
    pub devices: Vec<DeviceInfo>,
    pub connected_device: Option<DeviceInfo>,
    pub scanning: bool,
    pub last_error: Option<String>,
}

/// Unified response envelope for device commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConsoleCommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> ConsoleCommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Device commands ───────────────────────────────────────────────────────────

/// Runs one scan pass and returns the refreshed device list.
pub async fn scan_for_devices(
    state: &ConsoleAppState,
) -> ConsoleCommandResult<Vec<DeviceInfo>> {
    let mut registry = state.registry.lock().await;
    if registry.scan().await {
        ConsoleCommandResult::ok(registry.devices())
    } else {
        ConsoleCommandResult::err(last_error_message(&registry))
    }
}

/// Connects to a discovered device and returns its refreshed entry.
pub async fn connect_device(
    state: &ConsoleAppState,
    id: &str,
) -> ConsoleCommandResult<DeviceInfo> {
    let mut registry = state.registry.lock().await;
    if registry.connect(id).await {
        match registry.connected_device() {
            Some(device) => ConsoleCommandResult::ok(device),
            None => ConsoleCommandResult::err("connected device missing from registry"),
        }
    } else {
        ConsoleCommandResult::err(last_error_message(&registry))
    }
}

/// Disconnects the given device, or the connected one when `id` is `None`.
pub async fn disconnect_device(
    state: &ConsoleAppState,
    id: Option<&str>,
) -> ConsoleCommandResult<()> {
    let mut registry = state.registry.lock().await;
    if registry.disconnect(id).await {
        ConsoleCommandResult::ok(())
    } else {
        ConsoleCommandResult::err(last_error_message(&registry))
    }
}

/// Reads the battery level of a connected device.
pub async fn read_battery_level(
    state: &ConsoleAppState,
    id: &str,
) -> ConsoleCommandResult<u8> {
    let mut registry = state.registry.lock().await;
    match registry.battery_level(id).await {
        Some(level) => ConsoleCommandResult::ok(level),
        None => ConsoleCommandResult::err(last_error_message(&registry)),
    }
}

/// Returns the current Bluetooth status snapshot.
pub async fn bluetooth_status(state: &ConsoleAppState) -> ConsoleCommandResult<BluetoothStatusDto> {
    let registry = state.registry.lock().await;
    ConsoleCommandResult::ok(BluetoothStatusDto {
        devices: registry.devices(),
        connected_device: registry.connected_device(),
        scanning: registry.is_scanning(),
        last_error: registry.last_error().map(str::to_string),
    })
}

/// Clears the last-error slot.
pub async fn clear_error(state: &ConsoleAppState) -> ConsoleCommandResult<()> {
    state.registry.lock().await.clear_error();
    ConsoleCommandResult::ok(())
}

/// Forgets every known device. Payload state is untouched.
pub async fn clear_devices(state: &ConsoleAppState) -> ConsoleCommandResult<()> {
    state.registry.lock().await.clear_devices();
    ConsoleCommandResult::ok(())
}

// ── Payload commands ──────────────────────────────────────────────────────────

/// Returns the current payload record without recording a history entry.
pub async fn current_payload(
    state: &ConsoleAppState,
) -> ConsoleCommandResult<blectl_core::PayloadRecord> {
    ConsoleCommandResult::ok(state.commands.lock().await.payload())
}

/// Returns the command history, newest first.
pub async fn command_history(
    state: &ConsoleAppState,
) -> ConsoleCommandResult<Vec<CommandResult>> {
    ConsoleCommandResult::ok(state.commands.lock().await.history())
}

/// Discards the command history.
pub async fn clear_history(state: &ConsoleAppState) -> ConsoleCommandResult<()> {
    state.commands.lock().await.clear_history();
    ConsoleCommandResult::ok(())
}

/// Dispatches one payload command by its wire name.
///
/// `SEND_REQUEST`/`GET_REQUEST` require a connected device; their command
/// strings are generated and logged, but with no transmission path
/// implemented the result reports failure rather than pretending the
/// peripheral saw anything. Unknown names fail without touching the
/// history (the audit log records payload operations only).
pub async fn run_payload_command(
    state: &ConsoleAppState,
    name: &str,
    value: Option<&str>,
) -> CommandResult {
    let raw = value.unwrap_or_default();
    let mut commands = state.commands.lock().await;
    match name {
        encoder::SET_ID => commands.set_id(raw),
        encoder::SET_NAME => commands.set_name(raw),
        encoder::SET_STATUS => commands.set_status(raw),
        encoder::SET_DEVICE => commands.set_device(raw),
        encoder::SET_ACTION => commands.set_action(raw),
        encoder::SET_TIMESTAMP => commands.set_timestamp(raw),
        encoder::SET_PAYLOAD => commands.set_payload(raw),
        encoder::GET_PAYLOAD => commands.get_payload(),
        encoder::RESET_PAYLOAD => commands.reset_payload(),
        encoder::SEND_REQUEST | encoder::GET_REQUEST => {
            drop(commands);
            send_request(state, name, value).await
        }
        _ => CommandResult::err(format!("Unknown command: {name}")),
    }
}

/// Handles the two peripheral-request commands.
async fn send_request(state: &ConsoleAppState, name: &str, value: Option<&str>) -> CommandResult {
    let registry = state.registry.lock().await;
    let Some(device) = registry.connected_device() else {
        return CommandResult::err("No device connected. Please connect to a BLE device first.");
    };

    let command_string = generate_command_string(name, value);
    info!(device = %device.id, command = %command_string, "command string generated");
    CommandResult::err(format!(
        "{name} not transmitted: no transmission path to the peripheral"
    ))
}

fn last_error_message(registry: &DeviceRegistry) -> String {
    registry
        .last_error()
        .unwrap_or("operation failed")
        .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
