//! Shared identifier types and error helpers used across all courier crates.

pub mod error;
pub mod snowflake;

pub use {
    error::FromMessage,
    snowflake::{ParseSnowflakeError, Snowflake},
};
