//! blectl-console library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does blectl-console do?
//!
//! The console is the operator-facing half of blectl. It drives a BLE
//! central radio to discover nearby peripherals, connect to one, and read
//! its battery level, while maintaining the local command payload defined
//! in `blectl-core`. The pieces:
//!
//! 1. The infrastructure layer wraps the host Bluetooth stack (`btleplug`)
//!    behind the [`infrastructure::bluetooth::BleCentral`] trait, with a
//!    mock implementation for tests and radio-less runs.
//! 2. The application layer's device registry tracks every discovered
//!    peripheral, the single connected device, and the last platform error.
//! 3. The UI bridge exposes snapshot DTOs and command functions over shared
//!    state; the interactive console in `main.rs` is its only caller today.

/// Application layer: device registry use case.
pub mod application;

/// Infrastructure layer: Bluetooth platform adapters and the UI bridge.
pub mod infrastructure;
