//! Error types for the alarm-proto crate.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    /// Failed to encode a message.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a message.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Alarm type token outside the closed enumeration.
    #[error("unknown alarm type: {0}")]
    UnknownAlarmType(String),

    /// Alarm type code outside the closed enumeration.
    #[error("unknown alarm code: {0}")]
    UnknownAlarmCode(i32),
}
