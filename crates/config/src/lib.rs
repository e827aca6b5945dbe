//! Configuration loading, env substitution and overrides, and validation.
//!
//! Config files: `courier.toml`, `courier.yaml`, or `courier.json`
//! Searched in `./` then `~/.config/courier/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, and the
//! `BOT_TOKEN`, `GUILD_ID`, `CATEGORY_ID`, `DB_PATH` environment overrides.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load, load_config},
    schema::{CommandsConfig, CourierConfig, DiscordConfig, StoreConfig, TimeoutsConfig},
    validate::{Diagnostic, ResolvedConfig, Severity, ValidationResult, resolve, validate},
};
