//! Wire messages between `alarmctl` and a cluster endpoint.
//!
//! Every frame is a JSON text message, internally tagged by `type`.
//!
//! # Message Flow
//!
//! ```text
//! ┌──────────┐    ClientMessage     ┌──────────────────┐
//! │ alarmctl │─────────────────────►│ cluster endpoint │
//! │          │◄─────────────────────│                  │
//! └──────────┘    ServerMessage     └──────────────────┘
//! ```
//!
//! A connection starts with `hello` / `welcome`. After that each `alarm`
//! request is answered by exactly one `alarm` or `error` frame.
//!
//! # Example
//!
//! ```rust
//! use alarm_proto::{AlarmMember, AlarmRequest, AlarmType, ClientMessage};
//!
//! let request = ClientMessage::Alarm(AlarmRequest::activate(AlarmMember::new(
//!     1,
//!     AlarmType::NoSpace,
//! )));
//! let json = request.to_json().unwrap();
//! assert!(json.contains("\"action\":\"activate\""));
//! assert!(json.contains("\"alarm\":\"NOSPACE\""));
//! ```

use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmRequest, AlarmResponse};
use crate::ProtoError;

/// Protocol version for alarm administration.
pub const ALARM_PROTOCOL_VERSION: u32 = 1;

/// Error codes carried by [`ServerMessage::Error`].
pub mod error_codes {
    /// Malformed or unsupported request.
    pub const INVALID_REQUEST: u32 = 2001;
    /// Target member is not part of the cluster.
    pub const MEMBER_NOT_FOUND: u32 = 2002;
    /// Server-side failure.
    pub const INTERNAL_ERROR: u32 = 2003;
    /// Protocol version mismatch.
    pub const PROTOCOL_MISMATCH: u32 = 2004;
}

/// Messages sent from the client to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Handshake.
    Hello {
        /// Client version.
        version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Alarm RPC.
    Alarm(AlarmRequest),
}

impl ClientMessage {
    /// Create a hello message.
    #[must_use]
    pub fn hello(version: impl Into<String>) -> Self {
        Self::Hello {
            version: version.into(),
            protocol_version: ALARM_PROTOCOL_VERSION,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Request type name, for logs and error reporting.
    #[must_use]
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Alarm(request) => match request.action {
                crate::AlarmAction::Get => "alarm_get",
                crate::AlarmAction::Activate => "alarm_activate",
                crate::AlarmAction::Deactivate => "alarm_deactivate",
            },
        }
    }
}

/// Messages sent from the cluster to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted.
    Welcome {
        /// Server version.
        server_version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Alarm RPC result.
    Alarm(AlarmResponse),

    /// Request failed.
    Error {
        /// Error code, see [`error_codes`].
        code: u32,
        /// Error message.
        message: String,
    },
}

impl ServerMessage {
    /// Create a welcome response.
    #[must_use]
    pub fn welcome(server_version: impl Into<String>) -> Self {
        Self::Welcome {
            server_version: server_version.into(),
            protocol_version: ALARM_PROTOCOL_VERSION,
        }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Whether this is an error response.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
