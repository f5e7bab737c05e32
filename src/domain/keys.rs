//! Ordering keys of ledger entities

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("invalid timestamp {0:?} (expected seconds.nanoseconds)")]
    Timestamp(String),
    #[error("invalid entity id {0:?} (expected shard.realm.num)")]
    EntityId(String),
}

/// Consensus timestamp, `seconds.nanoseconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Human readable UTC form, falling back to the raw value
    pub fn to_utc_string(&self) -> String {
        i64::try_from(self.seconds)
            .ok()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, self.nanos))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl FromStr for Timestamp {
    type Err = KeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || KeyParseError::Timestamp(value.to_string());
        let trimmed = value.trim();
        let (secs, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if secs.is_empty() || frac.len() > 9 {
            return Err(invalid());
        }
        if !secs.chars().all(|ch| ch.is_ascii_digit()) || !frac.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let seconds = secs.parse::<u64>().map_err(|_| invalid())?;
        let nanos = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}").parse::<u32>().map_err(|_| invalid())?
        };
        Ok(Self { seconds, nanos })
    }
}

impl TryFrom<String> for Timestamp {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_string()
    }
}

/// Ledger entity id, `shard.realm.num`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    pub fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = KeyParseError;

    /// Accepts `shard.realm.num` or a bare `num` (shard and realm 0)
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || KeyParseError::EntityId(value.to_string());
        let parts = value
            .trim()
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [num] => Ok(Self::new(0, 0, *num)),
            [shard, realm, num] => Ok(Self::new(*shard, *realm, *num)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}
