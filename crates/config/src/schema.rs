//! Config schema types.

use std::path::PathBuf;

use {
    courier_common::Snowflake,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration, as read from file before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub discord: DiscordConfig,
    pub store: StoreConfig,
    pub commands: CommandsConfig,
    pub timeouts: TimeoutsConfig,
}

/// Bot account and the guild/category it watches.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Guild (server) whose channels are monitored.
    pub guild_id: Option<Snowflake>,

    /// Parent category; every guild channel under it is monitored.
    pub category_id: Option<Snowflake>,

    /// Drop messages from other bots as well as our own (default: true).
    pub ignore_other_bots: bool,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("category_id", &self.category_id)
            .field("ignore_other_bots", &self.ignore_other_bots)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            guild_id: None,
            category_id: None,
            ignore_other_bots: true,
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the subscription JSON document.
    pub path: Option<PathBuf>,
}

/// Inline command prefixes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandsConfig {
    pub subscribe_prefix: String,
    pub unsubscribe_prefix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            subscribe_prefix: "!sub".into(),
            unsubscribe_prefix: "!unsub".into(),
        }
    }
}

/// Upper bounds for calls to the Discord API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Channel existence checks and profile lookups.
    pub lookup_secs: u64,
    /// One private-message delivery, DM channel resolution included.
    pub delivery_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            lookup_secs: 10,
            delivery_secs: 15,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CourierConfig::default();
        assert!(cfg.discord.token.expose_secret().is_empty());
        assert!(cfg.discord.ignore_other_bots);
        assert_eq!(cfg.commands.subscribe_prefix, "!sub");
        assert_eq!(cfg.commands.unsubscribe_prefix, "!unsub");
        assert_eq!(cfg.timeouts.lookup_secs, 10);
        assert_eq!(cfg.timeouts.delivery_secs, 15);
        assert!(cfg.store.path.is_none());
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            [discord]
            token = "abc"
            guild_id = "1234567890123456789"
            category_id = "98765432109876543210"

            [store]
            path = "/var/lib/courier/db.json"

            [commands]
            subscribe_prefix = "?follow"
        "#;
        let cfg: CourierConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.discord.token.expose_secret(), "abc");
        assert_eq!(cfg.discord.guild_id.unwrap(), "1234567890123456789");
        assert_eq!(cfg.discord.category_id.unwrap(), "98765432109876543210");
        assert_eq!(cfg.store.path.unwrap(), PathBuf::from("/var/lib/courier/db.json"));
        assert_eq!(cfg.commands.subscribe_prefix, "?follow");
        // unspecified fields keep defaults
        assert_eq!(cfg.commands.unsubscribe_prefix, "!unsub");
        assert!(cfg.discord.ignore_other_bots);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = DiscordConfig {
            token: Secret::new("very-secret".into()),
            ..Default::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("very-secret"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn serialize_roundtrip() {
        let cfg = CourierConfig {
            discord: DiscordConfig {
                token: Secret::new("tok".into()),
                guild_id: Some("1".parse().unwrap()),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CourierConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.discord.token.expose_secret(), "tok");
        assert_eq!(back.discord.guild_id, cfg.discord.guild_id);
    }
}
