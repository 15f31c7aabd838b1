//! Identifier types used throughout hearth.
//!
//! Remote entities are keyed by 64-bit snowflakes. On the wire they travel as
//! decimal strings; numeric JSON values are accepted as well.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Milliseconds between the Unix epoch and the first second of 2015,
/// the epoch snowflake timestamps are relative to.
const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

/// Unique identifier for a remote entity (user, channel, guild, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Wraps a raw snowflake value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Parses a snowflake from its decimal string form.
    pub fn parse(s: &str) -> crate::Result<Self> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| crate::Error::InvalidSnowflake(s.to_string()))
    }

    /// Creation time embedded in the snowflake, in Unix milliseconds.
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        (self.0 >> 22) + SNOWFLAKE_EPOCH_MS
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom(format!("negative snowflake: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                Snowflake::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
