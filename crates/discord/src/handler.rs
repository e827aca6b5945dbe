//! Discord event handler for serenity.
//!
//! Converts gateway messages into [`InboundMessage`]s and runs them through
//! the relay pipeline.

use std::sync::Arc;

use {
    chrono::{DateTime, Utc},
    courier_channels::{InboundMessage, Pipeline},
    courier_common::Snowflake,
    serenity::{
        all::{Context, EventHandler, GatewayIntents, GuildId, Message, Ready},
        async_trait,
    },
    tracing::{debug, error, info},
};

/// Handler for Discord gateway events.
pub struct RelayHandler {
    pipeline: Arc<Pipeline>,
}

impl RelayHandler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }
}

fn inbound(msg: &Message, bot_user_id: u64) -> InboundMessage {
    let timestamp = DateTime::<Utc>::from_timestamp(msg.timestamp.unix_timestamp(), 0)
        .unwrap_or_else(Utc::now);
    InboundMessage {
        id: Snowflake::from(msg.id.get()),
        channel_id: Snowflake::from(msg.channel_id.get()),
        author_id: Snowflake::from(msg.author.id.get()),
        from_self: msg.author.id.get() == bot_user_id,
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        timestamp,
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            handlers = ?self.pipeline.handler_names(),
            "discord bot ready"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let bot_user_id = ctx.cache.current_user().id.get();
        let message = inbound(&msg, bot_user_id);

        match self.pipeline.dispatch(&message).await {
            Ok(outcome) => {
                debug!(message_id = %message.id, ?outcome, "message handled");
            },
            Err(e) if e.is_storage() => {
                error!(
                    message_id = %message.id,
                    channel_id = %message.channel_id,
                    error = %e,
                    "subscription store failure"
                );
            },
            Err(e) => {
                error!(message_id = %message.id, error = %e, "message handling failed");
            },
        }
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }
}
