//! Infrastructure layer: host Bluetooth adapters and the UI bridge.

pub mod bluetooth;
pub mod ui_bridge;
