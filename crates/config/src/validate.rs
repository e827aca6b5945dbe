//! Configuration validation.
//!
//! [`validate`] reports every problem at once; [`resolve`] turns a clean
//! config into the strongly typed [`ResolvedConfig`] the bot runs with.

use std::{path::PathBuf, time::Duration};

use {
    courier_common::Snowflake,
    secrecy::{ExposeSecret, Secret},
};

use crate::{
    Error, Result,
    schema::{CommandsConfig, CourierConfig},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "discord.guild_id"
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn error(&mut self, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            path,
            message: message.into(),
        });
    }

    fn warning(&mut self, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            path,
            message: message.into(),
        });
    }
}

/// Validated configuration: every required value is present.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub token: Secret<String>,
    pub guild_id: Snowflake,
    pub category_id: Snowflake,
    pub store_path: PathBuf,
    pub commands: CommandsConfig,
    pub ignore_other_bots: bool,
    pub lookup_timeout: Duration,
    pub delivery_timeout: Duration,
    /// Non-fatal findings from validation.
    pub warnings: Vec<Diagnostic>,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("category_id", &self.category_id)
            .field("store_path", &self.store_path)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

/// Check `config` for missing or inconsistent values.
pub fn validate(config: &CourierConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.discord.token.expose_secret().trim().is_empty() {
        result.error("discord.token", "required (or set BOT_TOKEN)");
    }
    if config.discord.guild_id.is_none() {
        result.error("discord.guild_id", "required (or set GUILD_ID)");
    }
    if config.discord.category_id.is_none() {
        result.error("discord.category_id", "required (or set CATEGORY_ID)");
    }
    if config.store.path.is_none() {
        result.error("store.path", "required (or set DB_PATH)");
    }

    let sub = &config.commands.subscribe_prefix;
    let unsub = &config.commands.unsubscribe_prefix;
    if sub.trim().is_empty() {
        result.error("commands.subscribe_prefix", "must not be empty");
    }
    if unsub.trim().is_empty() {
        result.error("commands.unsubscribe_prefix", "must not be empty");
    }
    if !sub.trim().is_empty() && sub == unsub {
        result.error(
            "commands.unsubscribe_prefix",
            "must differ from commands.subscribe_prefix",
        );
    }
    if sub.chars().any(char::is_whitespace) || unsub.chars().any(char::is_whitespace) {
        result.warning(
            "commands",
            "prefixes containing whitespace are hard to type correctly",
        );
    }

    if config.timeouts.lookup_secs == 0 {
        result.error("timeouts.lookup_secs", "must be greater than zero");
    }
    if config.timeouts.delivery_secs == 0 {
        result.error("timeouts.delivery_secs", "must be greater than zero");
    }

    if !config.discord.ignore_other_bots {
        result.warning(
            "discord.ignore_other_bots",
            "other bots' messages will be relayed and parsed as commands",
        );
    }

    result
}

/// Validate and convert into a [`ResolvedConfig`].
pub fn resolve(config: CourierConfig) -> Result<ResolvedConfig> {
    let result = validate(&config);
    if result.has_errors() {
        let problems = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| format!("{}: {}", d.path, d.message))
            .collect();
        return Err(Error::invalid(problems));
    }

    let missing = |what: &str| Error::message(format!("{what} missing after validation"));
    Ok(ResolvedConfig {
        token: config.discord.token,
        guild_id: config.discord.guild_id.ok_or_else(|| missing("guild_id"))?,
        category_id: config
            .discord
            .category_id
            .ok_or_else(|| missing("category_id"))?,
        store_path: config.store.path.ok_or_else(|| missing("store.path"))?,
        commands: config.commands,
        ignore_other_bots: config.discord.ignore_other_bots,
        lookup_timeout: Duration::from_secs(config.timeouts.lookup_secs),
        delivery_timeout: Duration::from_secs(config.timeouts.delivery_secs),
        warnings: result.diagnostics,
    })
}
