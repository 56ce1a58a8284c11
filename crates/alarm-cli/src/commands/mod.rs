//! CLI command implementations.
//!
//! - [`alarm`] - Arm, disarm and list cluster alarms

pub mod alarm;

pub use alarm::AlarmCommand;
