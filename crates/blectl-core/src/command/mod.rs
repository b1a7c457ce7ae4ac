//! Command module containing the payload validator/mutator and the flat
//! command string encoder.

pub mod encoder;
pub mod manager;

pub use encoder::generate_command_string;
pub use manager::{CommandError, CommandManager};
