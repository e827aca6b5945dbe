//! `courier check`: configuration validation and store health.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]` or `[info]` per item and
//! exits non-zero when anything failed.

use std::path::Path;

use {
    anyhow::Result,
    courier_config::{CourierConfig, Severity},
    courier_store::FileStore,
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct Section {
    title: String,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }

    fn failures(&self) -> usize {
        self.items
            .iter()
            .filter(|(status, _)| *status == Status::Fail)
            .count()
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for (status, message) in &section.items {
            eprintln!("  [{}{}{RESET}]  {message}", status.color(), status.label());
            match status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

pub async fn handle_check(explicit: Option<&Path>) -> Result<()> {
    let (config_section, config) = check_config(explicit);
    let mut sections = vec![config_section];
    if let Some(config) = config {
        sections.push(check_store(&config).await);
    }

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_config(explicit: Option<&Path>) -> (Section, Option<CourierConfig>) {
    let label = explicit
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "discovered config".into());
    let mut section = Section::new(format!("Config ({label})"));

    let mut config = match courier_config::discover_and_load(explicit) {
        Ok(config) => config,
        Err(e) => {
            section.push(Status::Fail, e.to_string());
            return (section, None);
        },
    };
    if let Err(e) = courier_config::apply_env_overrides(&mut config) {
        section.push(Status::Fail, e.to_string());
        return (section, None);
    }

    let result = courier_config::validate(&config);
    for d in &result.diagnostics {
        let status = match d.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
        };
        section.push(status, format!("{}: {}", d.path, d.message));
    }
    if section.failures() == 0 {
        section.push(Status::Ok, "configuration is complete");
    }
    (section, Some(config))
}

async fn check_store(config: &CourierConfig) -> Section {
    let mut section = Section::new("Subscription store");
    let Some(path) = config.store.path.as_deref() else {
        section.push(Status::Info, "skipped: no store path configured");
        return section;
    };

    // Read-only: a running bot may own this file.
    match FileStore::new(path).peek().await {
        Ok(None) => section.push(
            Status::Info,
            format!("{} does not exist yet; it is created on first run", path.display()),
        ),
        Ok(Some(doc)) => {
            let channels: usize = doc.iter().map(|(_, r)| r.subscribed.len()).sum();
            section.push(
                Status::Ok,
                format!(
                    "{}: {} user(s), {channels} subscription(s)",
                    path.display(),
                    doc.len()
                ),
            );
        },
        Err(courier_store::Error::Json(e)) => section.push(
            Status::Fail,
            format!(
                "{} is corrupt ({e}); the bot will move it aside and start empty",
                path.display()
            ),
        ),
        Err(e) => section.push(Status::Fail, format!("{}: {e}", path.display())),
    }
    section
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_summary_counts_users_and_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, r#"{"1":{"subscribed":["10","11"]},"2":{"subscribed":[]}}"#)
            .unwrap();

        let mut config = CourierConfig::default();
        config.store.path = Some(path);
        let section = check_store(&config).await;

        assert_eq!(section.items.len(), 1);
        assert_eq!(section.items[0].0, Status::Ok);
        assert!(section.items[0].1.ends_with("2 user(s), 2 subscription(s)"));
    }

    #[tokio::test]
    async fn missing_store_is_informational() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CourierConfig::default();
        config.store.path = Some(dir.path().join("absent.json"));

        let section = check_store(&config).await;
        assert_eq!(section.items[0].0, Status::Info);
        assert!(!dir.path().join("absent.json").exists());
    }

    #[tokio::test]
    async fn corrupt_store_fails_and_is_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut config = CourierConfig::default();
        config.store.path = Some(path.clone());
        let section = check_store(&config).await;

        assert_eq!(section.items.len(), 1);
        assert_eq!(section.items[0].0, Status::Fail);
        assert!(section.items[0].1.contains("corrupt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
        assert!(!dir.path().join("subs.json.corrupt").exists());
    }

    #[test]
    fn report_counts_failures_and_warnings() {
        let mut section = Section::new("t");
        section.push(Status::Fail, "a");
        section.push(Status::Warn, "b");
        section.push(Status::Ok, "c");
        assert_eq!(print_report(&[section]), (1, 1));
    }
}
