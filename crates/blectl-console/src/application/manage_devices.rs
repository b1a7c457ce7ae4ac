//! ManageDevicesUseCase: device registry and connection state management.
//!
//! The `DeviceRegistry` is the console's in-memory database of every BLE
//! peripheral seen during a scan pass. Each entry tracks the
//! platform-assigned id, the advertised name, and whether the last
//! connection attempt succeeded.
//!
//! # Failure model
//!
//! Every platform call is fallible, and none of those failures escape this
//! module as `Err`. Each failure is reduced to its display string in the
//! single last-error slot (overwritten by the next failure, cleared
//! explicitly) and the operation returns a failure indicator. There is no
//! retry; the caller re-invokes explicitly.
//!
//! # Connection lifecycle
//!
//! ```text
//! scan()  ──►  discovered  ──►  connect(id)  ──►  connected device
//!                                                       │
//!                                              disconnect([id])
//! ```
//!
//! At most one entry is "the" connected device at a time. Connecting a
//! second device repoints that slot without disconnecting the first; the
//! first stays flagged connected until it is disconnected explicitly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::infrastructure::bluetooth::{BleCentral, BluetoothError};

/// Display name used when a peripheral advertises none.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Platform-assigned peripheral identifier.
pub type DeviceId = String;

/// Registry entry for one peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    /// Outcome of the last connection attempt for this peripheral.
    pub connected: bool,
}

/// In-memory registry of all peripherals seen this session.
pub struct DeviceRegistry {
    central: Arc<dyn BleCentral>,
    scan_timeout: Duration,
    devices: HashMap<DeviceId, DeviceInfo>,
    connected: Option<DeviceId>,
    scanning: bool,
    last_error: Option<String>,
}

impl DeviceRegistry {
    pub fn new(central: Arc<dyn BleCentral>, scan_timeout: Duration) -> Self {
        Self {
            central,
            scan_timeout,
            devices: HashMap::new(),
            connected: None,
            scanning: false,
            last_error: None,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Snapshot of all known devices, sorted by name then id for stable
    /// display.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        let mut devices: Vec<DeviceInfo> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        devices
    }

    /// The device currently occupying the connected slot.
    pub fn connected_device(&self) -> Option<DeviceInfo> {
        self.connected
            .as_ref()
            .and_then(|id| self.devices.get(id))
            .cloned()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ── Platform operations ──────────────────────────────────────────────────

    /// Runs one scan pass and upserts every peripheral seen.
    ///
    /// Returns `true` when the pass completed, whether or not anything new
    /// was discovered. The scanning flag is set for the duration of the
    /// pass, success or failure.
    pub async fn scan(&mut self) -> bool {
        self.scanning = true;
        self.last_error = None;

        let outcome = self.central.discover(self.scan_timeout).await;
        self.scanning = false;

        match outcome {
            Ok(found) => {
                info!(count = found.len(), "scan pass complete");
                for discovered in found {
                    let connected = self
                        .devices
                        .get(&discovered.id)
                        .is_some_and(|known| known.connected);
                    self.devices.insert(
                        discovered.id.clone(),
                        DeviceInfo {
                            id: discovered.id,
                            name: discovered
                                .name
                                .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string()),
                            connected,
                        },
                    );
                }
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Connects to a previously discovered device and makes it the
    /// connected device.
    pub async fn connect(&mut self, id: &str) -> bool {
        if !self.devices.contains_key(id) {
            self.fail(BluetoothError::DeviceNotFound(id.to_string()));
            return false;
        }

        self.last_error = None;
        match self.central.connect(id).await {
            Ok(()) => {
                if let Some(device) = self.devices.get_mut(id) {
                    device.connected = true;
                }
                self.connected = Some(id.to_string());
                info!(device = %id, "connected");
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Disconnects the given device, or the connected device when no id is
    /// given. Clears the device's connected flag, and the connected slot if
    /// this device held it.
    pub async fn disconnect(&mut self, id: Option<&str>) -> bool {
        let Some(target) = id.map(str::to_string).or_else(|| self.connected.clone()) else {
            self.fail(BluetoothError::DeviceNotFound("no device is connected".to_string()));
            return false;
        };

        if !self.devices.contains_key(&target) {
            self.fail(BluetoothError::DeviceNotFound(target));
            return false;
        }

        self.last_error = None;
        match self.central.disconnect(&target).await {
            Ok(()) => {
                if let Some(device) = self.devices.get_mut(&target) {
                    device.connected = false;
                }
                if self.connected.as_deref() == Some(target.as_str()) {
                    self.connected = None;
                }
                info!(device = %target, "disconnected");
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Reads the battery level of a currently connected device.
    ///
    /// Failures (unknown device, not connected, battery path unavailable)
    /// record the error and return `None` without touching the device's
    /// connected flag.
    pub async fn battery_level(&mut self, id: &str) -> Option<u8> {
        let connected = self.devices.get(id).is_some_and(|d| d.connected);
        if !connected {
            self.fail(BluetoothError::ServiceUnavailable(
                "device not connected".to_string(),
            ));
            return None;
        }

        self.last_error = None;
        match self.central.read_battery_level(id).await {
            Ok(level) => {
                info!(device = %id, level, "battery level read");
                Some(level)
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    // ── Maintenance ──────────────────────────────────────────────────────────

    /// Clears the last-error slot.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Forgets every known device and the connected slot. Does not issue
    /// platform disconnects.
    pub fn clear_devices(&mut self) {
        self.devices.clear();
        self.connected = None;
    }

    fn fail(&mut self, error: BluetoothError) {
        warn!(%error, "bluetooth operation failed");
        self.last_error = Some(error.to_string());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::MockCentral;

    const TIMEOUT: Duration = Duration::from_millis(10);

    fn registry(central: MockCentral) -> DeviceRegistry {
        DeviceRegistry::new(Arc::new(central), TIMEOUT)
    }

    // ── Scan ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_scan_upserts_discovered_devices() {
        // Arrange
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", Some("Thermometer"))
                .with_device("bb", None),
        );

        // Act
        let ok = registry.scan().await;

        // Assert
        assert!(ok);
        let devices = registry.devices();
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().any(|d| d.id == "aa" && d.name == "Thermometer"));
        assert!(devices.iter().any(|d| d.id == "bb" && d.name == UNKNOWN_DEVICE_NAME));
        assert!(devices.iter().all(|d| !d.connected));
    }

    #[tokio::test]
    async fn test_rescan_replaces_entry_but_preserves_connected_flag() {
        let mut registry = registry(MockCentral::new().with_device("aa", Some("Old Name")));
        registry.scan().await;
        registry.connect("aa").await;

        // A second pass sees the same peripheral again.
        registry.scan().await;

        let devices = registry.devices();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].connected);
    }

    #[tokio::test]
    async fn test_scan_failure_sets_last_error_and_clears_scanning_flag() {
        let mut registry = registry(MockCentral::new().failing_discover(
            BluetoothError::NotAvailable("adapter powered off".to_string()),
        ));

        let ok = registry.scan().await;

        assert!(!ok);
        assert!(!registry.is_scanning());
        assert_eq!(
            registry.last_error(),
            Some("Bluetooth is not available: adapter powered off")
        );
    }

    // ── Connect ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_marks_device_and_fills_slot() {
        let mut registry = registry(MockCentral::new().with_device("aa", Some("Thermometer")));
        registry.scan().await;

        let ok = registry.connect("aa").await;

        assert!(ok);
        let connected = registry.connected_device().unwrap();
        assert_eq!(connected.id, "aa");
        assert!(connected.connected);
    }

    #[tokio::test]
    async fn test_connect_unknown_device_fails_without_platform_call() {
        let central = Arc::new(MockCentral::new());
        let mut registry = DeviceRegistry::new(central.clone(), TIMEOUT);

        let ok = registry.connect("nope").await;

        assert!(!ok);
        assert_eq!(registry.last_error(), Some("Device not found: nope"));
        assert!(registry.connected_device().is_none());
        assert!(central.connect_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_platform_failure_records_error_and_leaves_flags() {
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", None)
                .failing_connect(BluetoothError::ConnectFailed("GATT error".to_string())),
        );
        registry.scan().await;

        let ok = registry.connect("aa").await;

        assert!(!ok);
        assert_eq!(
            registry.last_error(),
            Some("Failed to connect to device: GATT error")
        );
        assert!(registry.connected_device().is_none());
        assert!(!registry.devices()[0].connected);
    }

    #[tokio::test]
    async fn test_connecting_second_device_repoints_slot_without_disconnecting_first() {
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", None)
                .with_device("bb", None),
        );
        registry.scan().await;
        registry.connect("aa").await;

        registry.connect("bb").await;

        assert_eq!(registry.connected_device().unwrap().id, "bb");
        // The first device keeps its connected flag; only an explicit
        // disconnect clears it.
        let first = registry
            .devices()
            .into_iter()
            .find(|d| d.id == "aa")
            .unwrap();
        assert!(first.connected);
    }

    // ── Disconnect ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_disconnect_without_id_targets_connected_device() {
        let mut registry = registry(MockCentral::new().with_device("aa", None));
        registry.scan().await;
        registry.connect("aa").await;

        let ok = registry.disconnect(None).await;

        assert!(ok);
        assert!(registry.connected_device().is_none());
        assert!(!registry.devices()[0].connected);
    }

    #[tokio::test]
    async fn test_disconnect_without_id_and_no_connection_fails() {
        let mut registry = registry(MockCentral::new());

        let ok = registry.disconnect(None).await;

        assert!(!ok);
        assert_eq!(
            registry.last_error(),
            Some("Device not found: no device is connected")
        );
    }

    #[tokio::test]
    async fn test_disconnect_of_non_slot_device_keeps_slot() {
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", None)
                .with_device("bb", None),
        );
        registry.scan().await;
        registry.connect("aa").await;
        registry.connect("bb").await;

        let ok = registry.disconnect(Some("aa")).await;

        assert!(ok);
        assert_eq!(registry.connected_device().unwrap().id, "bb");
    }

    #[tokio::test]
    async fn test_disconnect_platform_failure_keeps_flags() {
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", None)
                .failing_disconnect(BluetoothError::DisconnectFailed("busy".to_string())),
        );
        registry.scan().await;
        registry.connect("aa").await;

        let ok = registry.disconnect(None).await;

        assert!(!ok);
        assert_eq!(
            registry.last_error(),
            Some("Failed to disconnect from device: busy")
        );
        assert_eq!(registry.connected_device().unwrap().id, "aa");
    }

    // ── Battery ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_battery_level_requires_connection() {
        let central = MockCentral::new()
            .with_device("aa", None)
            .with_battery("aa", 90);
        let mut registry = registry(central);
        registry.scan().await;

        let level = registry.battery_level("aa").await;

        assert_eq!(level, None);
        assert_eq!(
            registry.last_error(),
            Some("Failed to read battery level: device not connected")
        );
        // The failed read does not alter the device's connected flag.
        assert!(!registry.devices()[0].connected);
    }

    #[tokio::test]
    async fn test_battery_level_reads_connected_device() {
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", None)
                .with_battery("aa", 73),
        );
        registry.scan().await;
        registry.connect("aa").await;

        let level = registry.battery_level("aa").await;

        assert_eq!(level, Some(73));
    }

    #[tokio::test]
    async fn test_battery_read_failure_records_error_and_keeps_connection() {
        let mut registry = registry(
            MockCentral::new()
                .with_device("aa", None)
                .failing_battery(BluetoothError::ServiceUnavailable(
                    "battery level characteristic not found".to_string(),
                )),
        );
        registry.scan().await;
        registry.connect("aa").await;

        let level = registry.battery_level("aa").await;

        assert_eq!(level, None);
        assert_eq!(
            registry.last_error(),
            Some("Failed to read battery level: battery level characteristic not found")
        );
        assert!(registry.devices()[0].connected);
    }

    // ── Maintenance ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_clear_error_empties_slot() {
        let mut registry = registry(MockCentral::new());
        registry.connect("nope").await;
        assert!(registry.last_error().is_some());

        registry.clear_error();

        assert!(registry.last_error().is_none());
    }

    #[tokio::test]
    async fn test_clear_devices_forgets_registry_and_slot() {
        let mut registry = registry(MockCentral::new().with_device("aa", None));
        registry.scan().await;
        registry.connect("aa").await;

        registry.clear_devices();

        assert!(registry.devices().is_empty());
        assert!(registry.connected_device().is_none());
    }
}
