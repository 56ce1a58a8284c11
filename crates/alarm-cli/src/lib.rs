//! # alarm-cli
//!
//! Administrative command surface for cluster alarms.
//!
//! Provides commands for:
//! - Arming an alarm against a member
//! - Disarming all active alarms
//! - Listing active alarms
//!
//! # Architecture
//!
//! The `alarmctl` binary parses the command line, then hands the alarm
//! subcommand to [`commands::AlarmCommand`] together with an
//! [`client::AlarmClient`] and a [`context::ContextSource`]. The handler
//! never exits the process: it returns a [`CommandError`] that `main` maps to
//! an exit code.
//!
//! ```text
//! ┌───────────┐    alarm-proto frames    ┌──────────────────┐
//! │ alarmctl  │◄────────────────────────►│ cluster endpoint │
//! └───────────┘       (WebSocket)        └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod context;
pub mod error;
pub mod exitcode;
pub mod output;

pub use cli::{AlarmCommands, Cli, Commands, Format};
pub use client::{AlarmClient, ClientError, ClusterClient};
pub use context::{ContextSource, RequestContext};
pub use error::CommandError;
pub use output::OutputFormat;
