use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    error::Context,
    schema::CourierConfig,
    validate::{ResolvedConfig, resolve},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "courier.toml",
    "courier.yaml",
    "courier.yml",
    "courier.json",
];

/// Load, override from the environment and validate in one go.
///
/// `explicit` wins over discovery. Missing required values are reported
/// together in a single [`Error::Invalid`].
pub fn load(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let mut config = discover_and_load(explicit)?;
    apply_env_overrides(&mut config)?;
    resolve(config)
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<CourierConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load config from `explicit`, else from standard locations.
///
/// Search order:
/// 1. `./courier.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/courier/courier.{toml,yaml,yml,json}` (user-global)
///
/// Returns `CourierConfig::default()` if no config file is found; the
/// environment may still supply everything required.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<CourierConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(CourierConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/courier/
    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/courier/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "courier").map(|d| d.config_dir().to_path_buf())
}

/// Apply `BOT_TOKEN`, `GUILD_ID`, `CATEGORY_ID` and `DB_PATH` over file values.
pub fn apply_env_overrides(config: &mut CourierConfig) -> Result<()> {
    apply_env_overrides_with(config, |key| std::env::var(key).ok())
}

pub(crate) fn apply_env_overrides_with(
    config: &mut CourierConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut problems = Vec::new();

    if let Some(token) = get("BOT_TOKEN") {
        config.discord.token = Secret::new(token);
    }
    for (key, slot) in [
        ("GUILD_ID", &mut config.discord.guild_id),
        ("CATEGORY_ID", &mut config.discord.category_id),
    ] {
        if let Some(value) = get(key) {
            match value.trim().parse() {
                Ok(id) => *slot = Some(id),
                Err(e) => problems.push(format!("{key}: {e}")),
            }
        }
    }
    if let Some(path) = get("DB_PATH") {
        config.store.path = Some(PathBuf::from(path));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid(problems))
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<CourierConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, tempfile::TempDir};

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn loads_each_format() {
        let tmp = TempDir::new().unwrap();
        let cases = [
            ("c.toml", "[discord]\nguild_id = \"1\"\n"),
            ("c.yaml", "discord:\n  guild_id: \"1\"\n"),
            ("c.json", r#"{"discord": {"guild_id": "1"}}"#),
        ];
        for (name, body) in cases {
            let path = tmp.path().join(name);
            std::fs::write(&path, body).unwrap();
            let cfg = load_config(&path).unwrap();
            assert_eq!(cfg.discord.guild_id.unwrap(), "1", "{name}");
        }
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("courier.ini");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = discover_and_load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = CourierConfig::default();
        cfg.store.path = Some(PathBuf::from("from-file.json"));

        apply_env_overrides_with(
            &mut cfg,
            env(&[
                ("BOT_TOKEN", "env-token"),
                ("GUILD_ID", "123"),
                ("CATEGORY_ID", " 98765432109876543210 "),
                ("DB_PATH", "/data/db.json"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.discord.token.expose_secret(), "env-token");
        assert_eq!(cfg.discord.guild_id.unwrap(), "123");
        assert_eq!(cfg.discord.category_id.unwrap(), "98765432109876543210");
        assert_eq!(cfg.store.path.unwrap(), PathBuf::from("/data/db.json"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = CourierConfig::default();
        apply_env_overrides_with(&mut cfg, env(&[("GUILD_ID", "  ")])).unwrap();
        assert!(cfg.discord.guild_id.is_none());
    }

    #[test]
    fn bad_env_ids_are_reported_together() {
        let mut cfg = CourierConfig::default();
        let err = apply_env_overrides_with(
            &mut cfg,
            env(&[("GUILD_ID", "abc"), ("CATEGORY_ID", "-5")]),
        )
        .unwrap_err();
        match err {
            Error::Invalid { problems } => {
                assert_eq!(problems.len(), 2);
                assert!(problems[0].starts_with("GUILD_ID"));
                assert!(problems[1].starts_with("CATEGORY_ID"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }
}
