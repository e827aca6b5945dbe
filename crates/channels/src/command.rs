//! Inline `subscribe` / `unsubscribe` commands.
//!
//! Recognition is a pure prefix match ([`CommandParser::syntax`]);
//! [`CommandParser::parse`] additionally asks the platform whether the target
//! channel exists, so handlers only pay for the lookup when the message is
//! theirs.

use std::{sync::Arc, time::Duration};

use {
    courier_common::Snowflake,
    courier_config::CommandsConfig,
    tracing::{debug, warn},
};

use crate::{error::with_timeout, platform::ChatPlatform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Subscribe,
    Unsubscribe,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

/// Outcome of parsing a message as a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NotACommand,
    Subscribe { target: Snowflake },
    Unsubscribe { target: Snowflake },
    /// Right prefix, but the remainder is not an id or names no reachable channel.
    InvalidTarget { kind: CommandKind, raw: String },
}

impl Command {
    pub fn kind(&self) -> Option<CommandKind> {
        match self {
            Self::NotACommand => None,
            Self::Subscribe { .. } => Some(CommandKind::Subscribe),
            Self::Unsubscribe { .. } => Some(CommandKind::Unsubscribe),
            Self::InvalidTarget { kind, .. } => Some(*kind),
        }
    }

    fn new(kind: CommandKind, target: Snowflake) -> Self {
        match kind {
            CommandKind::Subscribe => Self::Subscribe { target },
            CommandKind::Unsubscribe => Self::Unsubscribe { target },
        }
    }
}

/// Parses command text and validates targets against the platform.
pub struct CommandParser {
    /// Longest prefix first, so `!unsub` is never read as `!un` + `sub`.
    prefixes: Vec<(CommandKind, String)>,
    platform: Arc<dyn ChatPlatform>,
    lookup_timeout: Duration,
}

impl CommandParser {
    pub fn new(
        commands: &CommandsConfig,
        platform: Arc<dyn ChatPlatform>,
        lookup_timeout: Duration,
    ) -> Self {
        let mut prefixes = vec![
            (CommandKind::Subscribe, commands.subscribe_prefix.clone()),
            (CommandKind::Unsubscribe, commands.unsubscribe_prefix.clone()),
        ];
        prefixes.sort_by_key(|(_, prefix)| std::cmp::Reverse(prefix.len()));
        Self {
            prefixes,
            platform,
            lookup_timeout,
        }
    }

    /// Matched command kind and the trimmed text after its prefix.
    fn split<'a>(&self, text: &'a str) -> Option<(CommandKind, &'a str)> {
        let text = text.trim();
        self.prefixes.iter().find_map(|(kind, prefix)| {
            text.strip_prefix(prefix.as_str())
                .map(|rest| (*kind, rest.trim()))
        })
    }

    /// Recognize a command without touching the platform.
    ///
    /// A well-formed id yields `Subscribe`/`Unsubscribe`; anything else after
    /// a known prefix yields `InvalidTarget`.
    pub fn syntax(&self, text: &str) -> Command {
        let Some((kind, raw)) = self.split(text) else {
            return Command::NotACommand;
        };
        match raw.parse::<Snowflake>() {
            Ok(target) => Command::new(kind, target),
            Err(e) => {
                debug!(command = kind.as_str(), raw, error = %e, "malformed command target");
                Command::InvalidTarget {
                    kind,
                    raw: raw.to_string(),
                }
            },
        }
    }

    /// Parse `text` and confirm that its target names a reachable channel.
    ///
    /// Lookup errors and timeouts count as "does not exist". The platform is
    /// only consulted for syntactically valid targets.
    pub async fn parse(&self, text: &str) -> Command {
        let command = self.syntax(text);
        let (kind, target) = match command {
            Command::Subscribe { target } => (CommandKind::Subscribe, target),
            Command::Unsubscribe { target } => (CommandKind::Unsubscribe, target),
            other => return other,
        };

        let exists = with_timeout(
            "channel lookup",
            self.lookup_timeout,
            self.platform.channel_exists(&target),
        )
        .await;

        let rejected = |kind| Command::InvalidTarget {
            kind,
            raw: self
                .split(text)
                .map(|(_, raw)| raw.to_string())
                .unwrap_or_default(),
        };
        match exists {
            Ok(true) => Command::new(kind, target),
            Ok(false) => {
                debug!(command = kind.as_str(), channel_id = %target, "command target does not exist");
                rejected(kind)
            },
            Err(e) => {
                warn!(command = kind.as_str(), channel_id = %target, error = %e, "command target lookup failed");
                rejected(kind)
            },
        }
    }
}
