//! CLI commands for inspecting the subscription store.

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::Subcommand,
    courier_common::Snowflake,
    courier_store::{Document, FileStore},
};

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// List every user and the channels they follow.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the channels one user follows.
    Show {
        /// User id.
        user: Snowflake,
    },
}

/// Store path from config file and environment, without requiring the
/// Discord settings a full `run` needs.
pub fn store_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let mut config = courier_config::discover_and_load(explicit)?;
    courier_config::apply_env_overrides(&mut config)?;
    config
        .store
        .path
        .context("no subscription store configured (set store.path or DB_PATH)")
}

fn render(doc: &Document) -> Vec<String> {
    doc.iter()
        .map(|(user, record)| {
            let channels: Vec<&str> = record.subscribed.iter().map(Snowflake::as_str).collect();
            if channels.is_empty() {
                format!("  {user}: (none)")
            } else {
                format!("  {user}: {}", channels.join(", "))
            }
        })
        .collect()
}

/// The stored document, read without creating or repairing the file.
async fn read_document(path: &Path) -> anyhow::Result<Document> {
    let doc = FileStore::new(path)
        .peek()
        .await
        .with_context(|| format!("failed to read subscription store {}", path.display()))?;
    Ok(doc.unwrap_or_default())
}

pub async fn handle_subscriptions(
    action: SubscriptionAction,
    explicit: Option<&Path>,
) -> anyhow::Result<()> {
    let path = store_path(explicit)?;
    let doc = read_document(&path).await?;

    match action {
        SubscriptionAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else if doc.is_empty() {
                println!("No subscriptions in {}.", path.display());
            } else {
                for line in render(&doc) {
                    println!("{line}");
                }
            }
        },
        SubscriptionAction::Show { user } => match doc.get(&user) {
            Some(record) if !record.subscribed.is_empty() => {
                for channel in &record.subscribed {
                    println!("{channel}");
                }
            },
            _ => println!("User {user} has no subscriptions."),
        },
    }

    Ok(())
}
