//! # alarm-proto
//!
//! Protocol definitions for cluster alarm administration.
//!
//! - [`alarm`] holds the alarm data model: the closed [`AlarmType`]
//!   enumeration, [`AlarmMember`] and [`AlarmResponse`].
//! - [`messages`] holds the JSON frames exchanged between `alarmctl` and a
//!   cluster endpoint.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod alarm;
pub mod error;
pub mod messages;

pub use alarm::{AlarmAction, AlarmMember, AlarmRequest, AlarmResponse, AlarmType, ResponseHeader};
pub use error::ProtoError;
pub use messages::{ClientMessage, ServerMessage, ALARM_PROTOCOL_VERSION};
