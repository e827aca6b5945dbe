//! Discord adapter for the relay: a serenity-backed [`ChatPlatform`], the
//! gateway event handler, and bot startup.
//!
//! [`ChatPlatform`]: courier_channels::ChatPlatform

pub mod bot;
pub mod handler;
pub mod platform;

pub use {
    bot::{resolve_monitored_channels, start},
    handler::RelayHandler,
    platform::SerenityPlatform,
};
