//! Discord-style Snowflake ID.
//!
//! The gateway and REST API transmit ids as decimal strings so that
//! JavaScript clients do not lose precision; some payloads still carry
//! plain integers. Both forms are accepted on input and ids are always
//! emitted as strings.
//!
//! ```text
//! 64                         22          17          12          0
//! +---------------------------+-----------+-----------+-----------+
//! |         timestamp         |  worker   |  process  |  sequence |
//! |          (42 bits)        |  (5 bits) |  (5 bits) |  (12 bits)|
//! +---------------------------+-----------+-----------+-----------+
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Discord epoch: 2015-01-01T00:00:00Z in milliseconds
pub const DISCORD_EPOCH: u64 = 1420070400000;

/// A Discord-style Snowflake ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Milliseconds since the Unix epoch at which this id was minted.
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 22) + DISCORD_EPOCH
    }

    /// Get the timestamp as a DateTime.
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp() as i64)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl<'de> Visitor<'de> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Snowflake, E> {
                u64::try_from(value)
                    .map(Snowflake)
                    .map_err(|_| E::custom("snowflake cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Snowflake, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
