//! Per-invocation identifier attached to every tool call.
//!
//! Rendered as a TypeID, e.g. `req_01h455vb4pex5vsknk084sn02q`, so log lines
//! for one call can be grepped together and sort by start time.

use mti::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifies a single tool invocation in logs and error reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(MagicTypeId);

/// Error returned when a string is not a valid request ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequestId {
    /// Not a TypeID at all
    Parse(String),
    /// A TypeID with a prefix other than `req`
    WrongPrefix {
        /// The expected prefix
        expected: &'static str,
        /// The prefix found
        actual: String,
    },
}

impl fmt::Display for InvalidRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid request ID: {e}"),
            Self::WrongPrefix { expected, actual } => {
                write!(f, "expected prefix '{expected}', got '{actual}'")
            }
        }
    }
}

impl std::error::Error for InvalidRequestId {}

impl RequestId {
    /// The TypeID prefix for request identifiers.
    pub const PREFIX: &'static str = "req";

    /// Generates a fresh, time-ordered ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Parses a request ID, checking the prefix.
    ///
    /// # Errors
    ///
    /// Fails if `s` is not a TypeID or carries a different prefix.
    pub fn parse(s: &str) -> Result<Self, InvalidRequestId> {
        let id = MagicTypeId::from_str(s).map_err(|e| InvalidRequestId::Parse(e.to_string()))?;

        let prefix = id.prefix().as_str();
        if prefix != Self::PREFIX {
            return Err(InvalidRequestId::WrongPrefix {
                expected: Self::PREFIX,
                actual: prefix.to_string(),
            });
        }

        Ok(Self(id))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = InvalidRequestId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
