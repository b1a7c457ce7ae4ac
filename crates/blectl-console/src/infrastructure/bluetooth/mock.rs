//! Canned in-memory implementation of the platform seam.
//!
//! Serves two callers: the test suites, which script devices, battery
//! levels, and injected failures; and the `--mock` run mode, which lets the
//! console be driven end to end on a machine without a radio.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{BleCentral, BluetoothError, DiscoveredDevice};

/// Scriptable BLE central. Calls are recorded so tests can assert on what
/// reached the platform boundary.
#[derive(Default)]
pub struct MockCentral {
    devices: Vec<DiscoveredDevice>,
    battery: HashMap<String, u8>,
    fail_discover: Option<BluetoothError>,
    fail_connect: Option<BluetoothError>,
    fail_disconnect: Option<BluetoothError>,
    fail_battery: Option<BluetoothError>,
    pub connect_calls: Mutex<Vec<String>>,
    pub disconnect_calls: Mutex<Vec<String>>,
    pub battery_calls: Mutex<Vec<String>>,
}

impl MockCentral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two canned peripherals, one of them nameless; backs the `--mock`
    /// run mode.
    pub fn demo() -> Self {
        Self::new()
            .with_device("mock-0", Some("ESP32-S3 DevKit"))
            .with_battery("mock-0", 87)
            .with_device("mock-1", None)
    }

    /// Adds a peripheral to the next scan result.
    pub fn with_device(mut self, id: &str, name: Option<&str>) -> Self {
        self.devices.push(DiscoveredDevice {
            id: id.to_string(),
            name: name.map(str::to_string),
        });
        self
    }

    /// Sets the battery level a successful read will return.
    pub fn with_battery(mut self, id: &str, level: u8) -> Self {
        self.battery.insert(id.to_string(), level);
        self
    }

    pub fn failing_discover(mut self, error: BluetoothError) -> Self {
        self.fail_discover = Some(error);
        self
    }

    pub fn failing_connect(mut self, error: BluetoothError) -> Self {
        self.fail_connect = Some(error);
        self
    }

    pub fn failing_disconnect(mut self, error: BluetoothError) -> Self {
        self.fail_disconnect = Some(error);
        self
    }

    pub fn failing_battery(mut self, error: BluetoothError) -> Self {
        self.fail_battery = Some(error);
        self
    }
}

#[async_trait]
impl BleCentral for MockCentral {
    async fn discover(&self, _timeout: Duration) -> Result<Vec<DiscoveredDevice>, BluetoothError> {
        if let Some(error) = &self.fail_discover {
            return Err(error.clone());
        }
        Ok(self.devices.clone())
    }

    async fn connect(&self, id: &str) -> Result<(), BluetoothError> {
        self.connect_calls.lock().unwrap().push(id.to_string());
        if let Some(error) = &self.fail_connect {
            return Err(error.clone());
        }
        Ok(())
    }

    async fn disconnect(&self, id: &str) -> Result<(), BluetoothError> {
        self.disconnect_calls.lock().unwrap().push(id.to_string());
        if let Some(error) = &self.fail_disconnect {
            return Err(error.clone());
        }
        Ok(())
    }

    async fn read_battery_level(&self, id: &str) -> Result<u8, BluetoothError> {
        self.battery_calls.lock().unwrap().push(id.to_string());
        if let Some(error) = &self.fail_battery {
            return Err(error.clone());
        }
        self.battery.get(id).copied().ok_or_else(|| {
            BluetoothError::ServiceUnavailable("battery level characteristic not found".to_string())
        })
    }
}
