//! Message relay core.
//!
//! Every inbound message runs through a [`Pipeline`] of handlers: origin and
//! scope filters, the subscribe/unsubscribe commands, and finally the
//! fan-out that copies the message to each subscriber's private channel.
//! The chat platform itself sits behind the [`ChatPlatform`] trait.

pub mod broadcast;
pub mod command;
pub mod error;
pub mod handlers;
pub mod message;
pub mod pipeline;
pub mod platform;
pub mod recording;

pub use {
    broadcast::{BroadcastReport, Broadcaster},
    command::{Command, CommandKind, CommandParser},
    error::{Error, Result},
    handlers::{RelaySettings, relay_pipeline},
    message::InboundMessage,
    pipeline::{Dispatch, HandlerAction, HandlerStats, MessageHandler, Pipeline},
    platform::{ChatPlatform, RELAY_COLOR, RelayEmbed, UserProfile},
};
