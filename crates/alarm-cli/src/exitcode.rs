//! Process exit codes.
//!
//! These values are part of the command-line contract and must not change.

/// Successful termination.
pub const SUCCESS: u8 = 0;

/// The cluster call failed (transport, deadline, or server-reported error).
pub const ERROR: u8 = 1;

/// Malformed invocation, rejected before any cluster call.
pub const BAD_ARGS: u8 = 128;
