//! Integration tests for the console application state.
//!
//! These tests drive `ConsoleAppState` through the UI bridge's public API
//! the same way the interactive console does, with the mock central
//! standing in for the radio. They verify the full operator flows:
//!
//! - Discover peripherals, connect to one, read its battery level.
//! - Edit the payload through dispatched commands and observe the audit
//!   history.
//! - Error paths: battery reads against disconnected devices, scan
//!   failures, and peripheral requests with no transmission path.

use std::sync::Arc;
use std::time::Duration;

use blectl_console::infrastructure::bluetooth::{BluetoothError, MockCentral};
use blectl_console::infrastructure::ui_bridge::{
    self, bluetooth_status, command_history, connect_device, current_payload, disconnect_device,
    read_battery_level, run_payload_command, scan_for_devices, ConsoleAppState,
};

const TIMEOUT: Duration = Duration::from_millis(10);

fn state_with(central: MockCentral) -> Arc<ConsoleAppState> {
    ConsoleAppState::new(Arc::new(central), TIMEOUT)
}

/// The full happy path: scan, connect, read the battery, disconnect.
#[tokio::test]
async fn test_scan_connect_battery_disconnect_flow() {
    let state = state_with(
        MockCentral::new()
            .with_device("esp32", Some("ESP32-S3 DevKit"))
            .with_battery("esp32", 87),
    );

    let scan = scan_for_devices(&state).await;
    assert!(scan.success);
    assert_eq!(scan.data.unwrap().len(), 1);

    let connect = connect_device(&state, "esp32").await;
    assert!(connect.success);
    assert_eq!(connect.data.unwrap().name, "ESP32-S3 DevKit");

    let battery = read_battery_level(&state, "esp32").await;
    assert_eq!(battery.data, Some(87));

    let disconnect = disconnect_device(&state, None).await;
    assert!(disconnect.success);

    let status = bluetooth_status(&state).await.data.unwrap();
    assert!(status.connected_device.is_none());
    assert!(!status.devices[0].connected);
}

/// Battery reads against a device that is not connected record the error
/// in the status snapshot but leave the registry otherwise untouched.
#[tokio::test]
async fn test_battery_read_without_connection_surfaces_last_error() {
    let state = state_with(
        MockCentral::new()
            .with_device("esp32", None)
            .with_battery("esp32", 50),
    );
    scan_for_devices(&state).await;

    let battery = read_battery_level(&state, "esp32").await;
    assert!(!battery.success);

    let status = bluetooth_status(&state).await.data.unwrap();
    assert_eq!(
        status.last_error.as_deref(),
        Some("Failed to read battery level: device not connected")
    );
    assert!(!status.devices[0].connected);

    ui_bridge::clear_error(&state).await;
    let status = bluetooth_status(&state).await.data.unwrap();
    assert!(status.last_error.is_none());
}

/// A failed scan pass reports the platform error through the envelope.
#[tokio::test]
async fn test_scan_failure_reports_platform_error() {
    let state = state_with(MockCentral::new().failing_discover(BluetoothError::NotAvailable(
        "adapter powered off".to_string(),
    )));

    let scan = scan_for_devices(&state).await;

    assert!(!scan.success);
    assert_eq!(
        scan.error.as_deref(),
        Some("Bluetooth is not available: adapter powered off")
    );
}

/// Payload commands dispatched by wire name mutate the record and append
/// one audit entry each, successes and failures alike.
#[tokio::test]
async fn test_payload_command_flow_builds_audit_history() {
    let state = state_with(MockCentral::new());

    assert!(run_payload_command(&state, "SET_ID", Some("42")).await.success);
    assert!(run_payload_command(&state, "SET_NAME", Some("Alice")).await.success);
    assert!(
        !run_payload_command(&state, "SET_NAME", Some(&"x".repeat(51)))
            .await
            .success
    );
    assert!(
        run_payload_command(
            &state,
            "SET_PAYLOAD",
            Some(r#"{"action":"update","user":{"id":"7","name":"Bob"}}"#),
        )
        .await
        .success
    );

    let record = current_payload(&state).await.data.unwrap();
    assert_eq!(record.action, "update");
    assert_eq!(record.user.id, "7");
    assert_eq!(record.user.name, "Bob");

    let history = command_history(&state).await.data.unwrap();
    assert_eq!(history.len(), 4);
    assert!(history[0].success);
    assert!(!history[1].success);

    assert!(run_payload_command(&state, "RESET_PAYLOAD", None).await.success);
    let record = current_payload(&state).await.data.unwrap();
    assert_eq!(record.action, "add");
    assert_eq!(record.user.name, "DefaultUser");
}

/// Peripheral requests need a connection, and even then the console owns
/// no transmission path, so they never report success.
#[tokio::test]
async fn test_peripheral_requests_have_no_transmission_path() {
    let state = state_with(MockCentral::new().with_device("esp32", None));

    let without_connection = run_payload_command(&state, "GET_REQUEST", None).await;
    assert!(!without_connection.success);
    assert_eq!(
        without_connection.message,
        "No device connected. Please connect to a BLE device first."
    );

    scan_for_devices(&state).await;
    connect_device(&state, "esp32").await;

    let with_connection = run_payload_command(&state, "SEND_REQUEST", None).await;
    assert!(!with_connection.success);
    assert!(with_connection.message.contains("no transmission path"));
}

/// Clearing the device registry does not touch the payload state.
#[tokio::test]
async fn test_clear_devices_leaves_payload_state_alone() {
    let state = state_with(MockCentral::new().with_device("esp32", None));
    scan_for_devices(&state).await;
    run_payload_command(&state, "SET_NAME", Some("Alice")).await;

    ui_bridge::clear_devices(&state).await;

    let status = bluetooth_status(&state).await.data.unwrap();
    assert!(status.devices.is_empty());
    let record = current_payload(&state).await.data.unwrap();
    assert_eq!(record.user.name, "Alice");
    assert_eq!(command_history(&state).await.data.unwrap().len(), 1);
}
