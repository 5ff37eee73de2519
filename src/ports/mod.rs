//! Port traits: the capabilities the engine needs from the outside world.

pub mod config_port;
pub mod data_port;
pub mod notify_port;
pub mod state_port;
