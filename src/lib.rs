//! fundwatch: fund portfolio monitor with DCA replay, peak tracking and
//! rule-based advisories.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
