//! Alarm data model.
//!
//! An alarm is a cluster-wide condition flag raised against a member. The set
//! of alarm kinds is closed and owned by the protocol: tokens are matched
//! exactly and every token maps to exactly one integer code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Kind of alarm condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum AlarmType {
    /// No alarm. Used as the "any alarm" wildcard in disarm requests.
    #[default]
    #[serde(rename = "NONE")]
    None = 0,
    /// A member ran out of storage quota.
    #[serde(rename = "NOSPACE")]
    NoSpace = 1,
    /// A member detected data corruption.
    #[serde(rename = "CORRUPT")]
    Corrupt = 2,
}

impl AlarmType {
    /// Every alarm type, in code order.
    pub const ALL: [Self; 3] = [Self::None, Self::NoSpace, Self::Corrupt];

    /// Resolve a token such as `"NOSPACE"`.
    ///
    /// Matching is exact; `"nospace"` does not resolve.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == token)
    }

    /// The protocol token for this alarm type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::NoSpace => "NOSPACE",
            Self::Corrupt => "CORRUPT",
        }
    }

    /// The protocol integer code for this alarm type.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Comma-separated list of every valid token, for operator messages.
    #[must_use]
    pub fn valid_tokens() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AlarmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| ProtoError::UnknownAlarmType(s.to_string()))
    }
}

impl TryFrom<i32> for AlarmType {
    type Error = ProtoError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(ProtoError::UnknownAlarmCode(code))
    }
}

impl From<AlarmType> for i32 {
    fn from(kind: AlarmType) -> Self {
        kind.code()
    }
}

/// An alarm raised against a cluster member.
///
/// The default value (`member_id == 0`, `alarm == NONE`) means "any member,
/// any alarm".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AlarmMember {
    /// Member the alarm is raised against.
    pub member_id: u64,
    /// Alarm kind.
    pub alarm: AlarmType,
}

impl AlarmMember {
    /// Create an alarm member.
    #[must_use]
    pub const fn new(member_id: u64, alarm: AlarmType) -> Self {
        Self { member_id, alarm }
    }

    /// Whether this is the "any member, any alarm" wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        *self == Self::default()
    }
}

/// Operation carried by an [`AlarmRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmAction {
    /// List active alarms.
    Get,
    /// Raise an alarm.
    Activate,
    /// Clear an alarm.
    Deactivate,
}

impl fmt::Display for AlarmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Activate => write!(f, "activate"),
            Self::Deactivate => write!(f, "deactivate"),
        }
    }
}

/// A single alarm RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRequest {
    /// What to do.
    pub action: AlarmAction,
    /// Target member (zero for all members).
    pub member_id: u64,
    /// Target alarm kind.
    pub alarm: AlarmType,
}

impl AlarmRequest {
    /// Request the list of active alarms.
    #[must_use]
    pub const fn get() -> Self {
        Self {
            action: AlarmAction::Get,
            member_id: 0,
            alarm: AlarmType::None,
        }
    }

    /// Request that `member` be raised.
    #[must_use]
    pub const fn activate(member: AlarmMember) -> Self {
        Self {
            action: AlarmAction::Activate,
            member_id: member.member_id,
            alarm: member.alarm,
        }
    }

    /// Request that `member` be cleared.
    #[must_use]
    pub const fn deactivate(member: AlarmMember) -> Self {
        Self {
            action: AlarmAction::Deactivate,
            member_id: member.member_id,
            alarm: member.alarm,
        }
    }

    /// The member this request targets.
    #[must_use]
    pub const fn member(&self) -> AlarmMember {
        AlarmMember::new(self.member_id, self.alarm)
    }
}

/// Metadata attached to every cluster response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Cluster that served the request.
    pub cluster_id: u64,
    /// Member that served the request.
    pub member_id: u64,
    /// Store revision at the time of the response.
    pub revision: i64,
    /// Raft term at the time of the response.
    pub raft_term: u64,
}

/// Alarms affected by, or listed in, an alarm request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmResponse {
    /// Response metadata.
    #[serde(default)]
    pub header: ResponseHeader,
    /// Alarms, in the order the cluster returned them.
    #[serde(default)]
    pub alarms: Vec<AlarmMember>,
}

impl AlarmResponse {
    /// Create a response with the given alarms.
    #[must_use]
    pub fn new(header: ResponseHeader, alarms: Vec<AlarmMember>) -> Self {
        Self { header, alarms }
    }

    /// Whether the response carries no alarms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}
