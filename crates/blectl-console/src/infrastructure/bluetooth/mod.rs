//! Bluetooth platform seam.
//!
//! The device registry never talks to the radio directly; it goes through
//! the [`BleCentral`] trait so that tests (and the `--mock` run mode) can
//! substitute a canned implementation. The shipping implementation in
//! [`btle`] wraps the host stack via `btleplug`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod btle;
pub mod mock;

pub use btle::BtleplugCentral;
pub use mock::MockCentral;

// ── GATT identifiers ──────────────────────────────────────────────────────────

/// Battery Service (0x180F).
pub const BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Battery Level characteristic (0x2A19): one byte, 0–100 percent per the
/// GATT specification, though the console accepts any single-byte value.
pub const BATTERY_LEVEL: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures surfaced by the platform seam and the device registry.
///
/// Callers above the registry never see these as `Err`; the registry
/// reduces each to its display string in the single last-error slot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BluetoothError {
    /// The host has no usable Bluetooth stack at all.
    #[error("Bluetooth is not supported on this device")]
    NotSupported,

    /// The stack exists but no adapter is usable right now.
    #[error("Bluetooth is not available: {0}")]
    NotAvailable(String),

    /// The requested peripheral is not known to the platform or registry.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to connect to device: {0}")]
    ConnectFailed(String),

    #[error("Failed to disconnect from device: {0}")]
    DisconnectFailed(String),

    /// Anything on the battery read path: device not connected, service or
    /// characteristic absent, or the read itself failing.
    #[error("Failed to read battery level: {0}")]
    ServiceUnavailable(String),
}

// ── Platform types ────────────────────────────────────────────────────────────

/// Advertisement snapshot of one peripheral seen during a scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Platform-assigned identifier, unique per peripheral.
    pub id: String,
    /// Advertised display name, when the peripheral broadcasts one.
    pub name: Option<String>,
}

/// Host-side BLE central operations the console needs.
///
/// Every method maps to one awaited platform call; implementations do not
/// retry and do not cache results across calls.
#[async_trait]
pub trait BleCentral: Send + Sync {
    /// Runs one bounded scan pass and returns every peripheral seen.
    async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>, BluetoothError>;

    /// Opens a GATT connection to the given peripheral.
    async fn connect(&self, id: &str) -> Result<(), BluetoothError>;

    /// Closes the GATT connection to the given peripheral.
    async fn disconnect(&self, id: &str) -> Result<(), BluetoothError>;

    /// Reads the Battery Level characteristic of a connected peripheral.
    async fn read_battery_level(&self, id: &str) -> Result<u8, BluetoothError>;
}
