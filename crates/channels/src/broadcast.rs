//! Fan-out of monitored-channel messages to subscribers' DMs.

use std::{sync::Arc, time::Duration};

use {
    courier_common::Snowflake,
    courier_store::Subscriptions,
    futures::future::join_all,
    tracing::{debug, warn},
};

use crate::{
    Result,
    error::with_timeout,
    message::InboundMessage,
    platform::{ChatPlatform, RelayEmbed, UserProfile},
};

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<Snowflake>,
    /// Subscriber id and the reason delivery failed.
    pub failed: Vec<(Snowflake, String)>,
}

impl BroadcastReport {
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }
}

pub struct Broadcaster {
    subscriptions: Arc<Subscriptions>,
    platform: Arc<dyn ChatPlatform>,
    lookup_timeout: Duration,
    delivery_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        subscriptions: Arc<Subscriptions>,
        platform: Arc<dyn ChatPlatform>,
        lookup_timeout: Duration,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            subscriptions,
            platform,
            lookup_timeout,
            delivery_timeout,
        }
    }

    /// Deliver a copy of `message` to everyone subscribed to its channel.
    ///
    /// Only a store failure is returned as an error; individual delivery
    /// failures are collected in the report.
    pub async fn broadcast(&self, message: &InboundMessage) -> Result<BroadcastReport> {
        // The store lock is released before any network call.
        let subscribers = self.subscriptions.subscribers_of(&message.channel_id).await?;
        if subscribers.is_empty() {
            debug!(channel_id = %message.channel_id, "no subscribers, nothing to relay");
            return Ok(BroadcastReport::default());
        }

        let author = self.author_profile(&message.author_id).await;
        let embed = RelayEmbed::for_message(message, &author);

        let deliveries = subscribers.into_iter().map(|user| {
            let embed = &embed;
            async move {
                let result = with_timeout(
                    "relay delivery",
                    self.delivery_timeout,
                    self.deliver(&user, embed),
                )
                .await;
                (user, result)
            }
        });

        let mut report = BroadcastReport::default();
        for (user, result) in join_all(deliveries).await {
            match result {
                Ok(()) => report.delivered.push(user),
                Err(e) => {
                    warn!(
                        user_id = %user,
                        channel_id = %message.channel_id,
                        message_id = %message.id,
                        error = %e,
                        "relay delivery failed"
                    );
                    report.failed.push((user, e.to_string()));
                },
            }
        }
        Ok(report)
    }

    async fn deliver(&self, user: &Snowflake, embed: &RelayEmbed) -> Result<()> {
        let dm = self.platform.dm_channel(user).await?;
        self.platform.send_embed(&dm, embed).await
    }

    async fn author_profile(&self, author: &Snowflake) -> UserProfile {
        match with_timeout(
            "author lookup",
            self.lookup_timeout,
            self.platform.user_profile(author),
        )
        .await
        {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %author, error = %e, "author lookup failed, relaying with bare id");
                UserProfile::unknown(author)
            },
        }
    }
}
