//! The built-in relay handlers and the pipeline that chains them.

use std::{collections::HashSet, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    courier_common::Snowflake,
    courier_config::{CommandsConfig, ResolvedConfig},
    courier_store::{AddOutcome, Subscriptions},
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    broadcast::Broadcaster,
    command::{Command, CommandKind, CommandParser},
    message::InboundMessage,
    pipeline::{HandlerAction, MessageHandler, Pipeline},
    platform::{ChatPlatform, channel_mention},
};

/// Longest slice of user input echoed back in a rejection.
const MAX_ECHO_CHARS: usize = 64;

/// Knobs for [`relay_pipeline`].
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub commands: CommandsConfig,
    pub ignore_other_bots: bool,
    pub lookup_timeout: Duration,
    pub delivery_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            commands: CommandsConfig::default(),
            ignore_other_bots: true,
            lookup_timeout: Duration::from_secs(10),
            delivery_timeout: Duration::from_secs(15),
        }
    }
}

impl From<&ResolvedConfig> for RelaySettings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            commands: config.commands.clone(),
            ignore_other_bots: config.ignore_other_bots,
            lookup_timeout: config.lookup_timeout,
            delivery_timeout: config.delivery_timeout,
        }
    }
}

/// Build the relay chain: origin filter, scope filter, subscribe,
/// unsubscribe, fan-out.
pub fn relay_pipeline(
    platform: Arc<dyn ChatPlatform>,
    subscriptions: Arc<Subscriptions>,
    monitored: Arc<HashSet<Snowflake>>,
    settings: RelaySettings,
) -> Pipeline {
    let parser = Arc::new(CommandParser::new(
        &settings.commands,
        Arc::clone(&platform),
        settings.lookup_timeout,
    ));
    let broadcaster = Broadcaster::new(
        Arc::clone(&subscriptions),
        Arc::clone(&platform),
        settings.lookup_timeout,
        settings.delivery_timeout,
    );

    Pipeline::new()
        .with(Arc::new(OriginFilter {
            ignore_other_bots: settings.ignore_other_bots,
        }))
        .with(Arc::new(ScopeFilter { monitored }))
        .with(Arc::new(CommandHandler {
            kind: CommandKind::Subscribe,
            parser: Arc::clone(&parser),
            subscriptions: Arc::clone(&subscriptions),
            platform: Arc::clone(&platform),
        }))
        .with(Arc::new(CommandHandler {
            kind: CommandKind::Unsubscribe,
            parser,
            subscriptions,
            platform,
        }))
        .with(Arc::new(FanOutHandler { broadcaster }))
}

/// Drops messages from this bot and, optionally, from any other bot.
pub struct OriginFilter {
    pub ignore_other_bots: bool,
}

#[async_trait]
impl MessageHandler for OriginFilter {
    fn name(&self) -> &str {
        "origin-filter"
    }

    async fn handle(&self, message: &InboundMessage) -> Result<HandlerAction> {
        if message.from_self || (self.ignore_other_bots && message.author_is_bot) {
            debug!(message_id = %message.id, author_id = %message.author_id, "ignoring bot message");
            return Ok(HandlerAction::Stop);
        }
        Ok(HandlerAction::Continue)
    }
}

/// Drops messages posted outside the monitored channels.
pub struct ScopeFilter {
    pub monitored: Arc<HashSet<Snowflake>>,
}

#[async_trait]
impl MessageHandler for ScopeFilter {
    fn name(&self) -> &str {
        "scope-filter"
    }

    async fn handle(&self, message: &InboundMessage) -> Result<HandlerAction> {
        if self.monitored.contains(&message.channel_id) {
            Ok(HandlerAction::Continue)
        } else {
            debug!(channel_id = %message.channel_id, "message outside monitored channels");
            Ok(HandlerAction::Stop)
        }
    }
}

/// Handles one command kind; passes everything else on.
pub struct CommandHandler {
    kind: CommandKind,
    parser: Arc<CommandParser>,
    subscriptions: Arc<Subscriptions>,
    platform: Arc<dyn ChatPlatform>,
}

impl CommandHandler {
    /// Store errors propagate before any reply is sent.
    async fn apply(&self, message: &InboundMessage, command: Command) -> Result<Option<String>> {
        let user = &message.author_id;
        let reply = match command {
            Command::Subscribe { target } => match self.subscriptions.add(user, &target).await? {
                AddOutcome::Added => format!("Subscribed to {}.", channel_mention(&target)),
                AddOutcome::AlreadySubscribed => {
                    format!("Already subscribed to {}.", channel_mention(&target))
                },
            },
            Command::Unsubscribe { target } => {
                self.subscriptions.remove(user, &target).await?;
                format!("Unsubscribed from {}.", channel_mention(&target))
            },
            Command::InvalidTarget { kind, raw } => {
                info!(user_id = %user, command = kind.as_str(), "rejected command target");
                rejection(kind, &raw)
            },
            Command::NotACommand => return Ok(None),
        };
        Ok(Some(reply))
    }
}

#[async_trait]
impl MessageHandler for CommandHandler {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn handle(&self, message: &InboundMessage) -> Result<HandlerAction> {
        if self.parser.syntax(&message.content).kind() != Some(self.kind) {
            return Ok(HandlerAction::Continue);
        }

        let command = self.parser.parse(&message.content).await;
        let Some(reply) = self.apply(message, command).await? else {
            return Ok(HandlerAction::Continue);
        };

        // The change is already saved; a lost confirmation is not an error.
        if let Err(e) = self
            .platform
            .send_reply(&message.channel_id, &message.id, &reply)
            .await
        {
            warn!(
                channel_id = %message.channel_id,
                message_id = %message.id,
                error = %e,
                "failed to send command reply"
            );
        }
        Ok(HandlerAction::Stop)
    }
}

fn rejection(kind: CommandKind, raw: &str) -> String {
    let verb = match kind {
        CommandKind::Subscribe => "subscribe to",
        CommandKind::Unsubscribe => "unsubscribe from",
    };
    if raw.is_empty() {
        return format!("Cannot {verb} nothing: give a channel id.");
    }
    let mut echoed: String = raw
        .chars()
        .filter(|c| *c != '`')
        .take(MAX_ECHO_CHARS)
        .collect();
    if raw.chars().filter(|c| *c != '`').count() > MAX_ECHO_CHARS {
        echoed.push('…');
    }
    format!("Cannot {verb} `{echoed}`: not a channel I can see.")
}

/// Default case: relay the message to its subscribers.
pub struct FanOutHandler {
    broadcaster: Broadcaster,
}

#[async_trait]
impl MessageHandler for FanOutHandler {
    fn name(&self) -> &str {
        "fan-out"
    }

    async fn handle(&self, message: &InboundMessage) -> Result<HandlerAction> {
        let report = self.broadcaster.broadcast(message).await?;
        if !report.is_empty() {
            info!(
                channel_id = %message.channel_id,
                message_id = %message.id,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "message relayed"
            );
        }
        Ok(HandlerAction::Stop)
    }
}
