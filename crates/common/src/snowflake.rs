//! Platform identifiers (channels, users, messages).
//!
//! Ids are kept as canonical decimal strings so they survive any value size:
//! platform ids already exceed the 2^53 range of JSON doubles, and nothing
//! here assumes they stay below 2^64 either.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de};

/// A non-negative integer identifier of arbitrary size.
///
/// The inner string holds ASCII digits without leading zeros (`"0"` for zero),
/// so string equality is numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Snowflake(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSnowflakeError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier `{input}` is not a non-negative integer")]
    InvalidDigit { input: String },
}

impl Snowflake {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Narrow to the platform's 64-bit representation, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for Snowflake {
    type Err = ParseSnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseSnowflakeError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseSnowflakeError::InvalidDigit {
                input: s.to_string(),
            });
        }
        let trimmed = s.trim_start_matches('0');
        if trimmed.is_empty() {
            Ok(Self("0".into()))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Snowflake {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Snowflake {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Snowflake {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// Canonical form has no leading zeros, so a longer string is a larger number.
impl Ord for Snowflake {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Snowflake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl de::Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal identifier string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse().map_err(E::custom)
            }

            // Hand-edited files may carry small ids as bare integers.
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake::from(v))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
