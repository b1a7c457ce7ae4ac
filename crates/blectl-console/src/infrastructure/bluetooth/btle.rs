//! btleplug-backed implementation of the platform seam.
//!
//! Wraps the first host adapter. One `discover` call is one scan window:
//! start scanning, wait out the timeout, stop, and report whatever the
//! adapter has seen. Peripherals are addressed by the platform id string
//! (`PeripheralId`'s display form), which is stable for the lifetime of the
//! process.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time;
use tracing::{debug, warn};

use super::{BleCentral, BluetoothError, DiscoveredDevice, BATTERY_LEVEL};

/// BLE central over the host Bluetooth stack.
pub struct BtleplugCentral {
    adapter: Adapter,
}

impl BtleplugCentral {
    /// Connects to the host Bluetooth stack and claims the first adapter.
    ///
    /// # Errors
    ///
    /// [`BluetoothError::NotSupported`] when the stack cannot be reached at
    /// all, [`BluetoothError::NotAvailable`] when it is reachable but no
    /// adapter is present.
    pub async fn new() -> Result<Self, BluetoothError> {
        let manager = Manager::new()
            .await
            .map_err(|_| BluetoothError::NotSupported)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| BluetoothError::NotAvailable(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| BluetoothError::NotAvailable("no Bluetooth adapter present".to_string()))?;

        Ok(Self { adapter })
    }

    /// Looks up a peripheral the adapter has already seen.
    async fn peripheral(&self, id: &str) -> Result<Peripheral, BluetoothError> {
        self.adapter
            .peripherals()
            .await
            .map_err(|e| BluetoothError::NotAvailable(e.to_string()))?
            .into_iter()
            .find(|p| p.id().to_string() == id)
            .ok_or_else(|| BluetoothError::DeviceNotFound(id.to_string()))
    }
}

#[async_trait]
impl BleCentral for BtleplugCentral {
    async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>, BluetoothError> {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| BluetoothError::NotAvailable(e.to_string()))?;

        time::sleep(timeout).await;

        if let Err(e) = self.adapter.stop_scan().await {
            // The scan window is over either way; the peripheral list below
            // is still valid.
            warn!(error = %e, "failed to stop scan");
        }

        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| BluetoothError::NotAvailable(e.to_string()))?;

        let mut devices = Vec::with_capacity(peripherals.len());
        for peripheral in peripherals {
            let name = peripheral
                .properties()
                .await
                .ok()
                .flatten()
                .and_then(|props| props.local_name);
            devices.push(DiscoveredDevice {
                id: peripheral.id().to_string(),
                name,
            });
        }

        debug!(count = devices.len(), "scan window closed");
        Ok(devices)
    }

    async fn connect(&self, id: &str) -> Result<(), BluetoothError> {
        let peripheral = self.peripheral(id).await?;
        peripheral
            .connect()
            .await
            .map_err(|e| BluetoothError::ConnectFailed(e.to_string()))
    }

    async fn disconnect(&self, id: &str) -> Result<(), BluetoothError> {
        let peripheral = self.peripheral(id).await?;
        peripheral
            .disconnect()
            .await
            .map_err(|e| BluetoothError::DisconnectFailed(e.to_string()))
    }

    async fn read_battery_level(&self, id: &str) -> Result<u8, BluetoothError> {
        let peripheral = self.peripheral(id).await?;

        peripheral
            .discover_services()
            .await
            .map_err(|e| BluetoothError::ServiceUnavailable(e.to_string()))?;

        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == BATTERY_LEVEL)
            .ok_or_else(|| {
                BluetoothError::ServiceUnavailable(
                    "battery level characteristic not found".to_string(),
                )
            })?;

        let value = peripheral
            .read(&characteristic)
            .await
            .map_err(|e| BluetoothError::ServiceUnavailable(e.to_string()))?;

        value.first().copied().ok_or_else(|| {
            BluetoothError::ServiceUnavailable("empty battery level read".to_string())
        })
    }
}
