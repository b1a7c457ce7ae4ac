//! Application layer: use cases for the console.

pub mod manage_devices;
