use std::{collections::HashSet, sync::Arc};

use {
    anyhow::Context as _,
    courier_channels::{ChatPlatform, RelaySettings, relay_pipeline},
    courier_common::Snowflake,
    courier_config::ResolvedConfig,
    courier_store::{FileStore, SubscriptionStore, Subscriptions},
    secrecy::ExposeSecret,
    serenity::{
        Client,
        http::Http,
        model::id::{ChannelId, GuildId},
    },
    tracing::{info, warn},
};

use crate::{handler::RelayHandler, platform::SerenityPlatform};

/// Channels whose parent is `category`.
fn children_of(
    channels: impl IntoIterator<Item = (ChannelId, Option<ChannelId>)>,
    category: ChannelId,
) -> HashSet<Snowflake> {
    channels
        .into_iter()
        .filter(|(_, parent)| *parent == Some(category))
        .map(|(id, _)| Snowflake::from(id.get()))
        .collect()
}

/// Resolve the monitored set: every channel of `guild` filed under `category`.
///
/// Called once at startup; channels added later are not picked up.
pub async fn resolve_monitored_channels(
    http: &Http,
    guild: &Snowflake,
    category: &Snowflake,
) -> anyhow::Result<HashSet<Snowflake>> {
    let guild_id = guild
        .to_u64()
        .filter(|v| *v != 0)
        .map(GuildId::new)
        .with_context(|| format!("guild id {guild} is out of range"))?;
    let category_id = category
        .to_u64()
        .filter(|v| *v != 0)
        .map(ChannelId::new)
        .with_context(|| format!("category id {category} is out of range"))?;

    let channels = guild_id
        .channels(http)
        .await
        .with_context(|| format!("failed to list channels of guild {guild}"))?;
    let monitored = children_of(
        channels
            .into_iter()
            .map(|(id, channel)| (id, channel.parent_id)),
        category_id,
    );

    if monitored.is_empty() {
        warn!(%guild, %category, "category has no channels; nothing will be relayed");
    } else {
        info!(%guild, %category, count = monitored.len(), "monitored channels resolved");
    }
    Ok(monitored)
}

/// Connect to the gateway and relay messages until the process is interrupted.
pub async fn start(config: ResolvedConfig) -> anyhow::Result<()> {
    for warning in &config.warnings {
        warn!(%warning, "configuration warning");
    }

    let token = config.token.expose_secret();
    let http = Arc::new(Http::new(token));
    let monitored =
        resolve_monitored_channels(&http, &config.guild_id, &config.category_id).await?;

    let store = Arc::new(FileStore::new(&config.store_path)) as Arc<dyn SubscriptionStore>;
    let subscriptions = Arc::new(Subscriptions::new(store));
    let platform = Arc::new(SerenityPlatform::new(Arc::clone(&http))) as Arc<dyn ChatPlatform>;
    let pipeline = relay_pipeline(
        platform,
        subscriptions,
        Arc::new(monitored),
        RelaySettings::from(&config),
    );

    let mut client = Client::builder(token, RelayHandler::intents())
        .event_handler(RelayHandler::new(Arc::new(pipeline)))
        .await
        .context("failed to build discord client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    info!(store = %config.store_path.display(), "starting discord relay");
    client.start().await.context("discord client stopped")?;
    Ok(())
}
