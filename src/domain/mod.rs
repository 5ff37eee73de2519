//! Core domain types and logic.

pub mod advisory;
pub mod alert;
pub mod config_validation;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod holding;
pub mod nav;
pub mod peak;
pub mod risk;
pub mod simulation;
pub mod threshold;
