//! [`ChatPlatform`] over serenity's HTTP client.

use std::sync::Arc;

use {
    async_trait::async_trait,
    courier_channels::{ChatPlatform, Error, RelayEmbed, Result, UserProfile},
    courier_common::Snowflake,
    serenity::{
        builder::{CreateEmbed, CreateEmbedAuthor, CreateMessage},
        http::{Http, HttpError},
        model::{
            Timestamp,
            id::{ChannelId, MessageId, UserId},
        },
    },
    tracing::debug,
};

/// Discord ids are non-zero 64-bit integers; anything else cannot exist there.
pub(crate) fn discord_id(id: &Snowflake) -> Option<u64> {
    id.to_u64().filter(|v| *v != 0)
}

fn channel_id(id: &Snowflake) -> Result<ChannelId> {
    discord_id(id)
        .map(ChannelId::new)
        .ok_or_else(|| Error::invalid_input(format!("{id} is not a discord channel id")))
}

fn user_id(id: &Snowflake) -> Result<UserId> {
    discord_id(id)
        .map(UserId::new)
        .ok_or_else(|| Error::invalid_input(format!("{id} is not a discord user id")))
}

fn message_id(id: &Snowflake) -> Result<MessageId> {
    discord_id(id)
        .map(MessageId::new)
        .ok_or_else(|| Error::invalid_input(format!("{id} is not a discord message id")))
}

/// 403 and 404 both mean "this bot cannot see it".
fn is_not_visible(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp))
            if matches!(resp.status_code.as_u16(), 403 | 404)
    )
}

fn build_embed(embed: &RelayEmbed) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(&embed.author_name);
    if let Some(ref icon) = embed.author_icon_url {
        author = author.icon_url(icon);
    }
    let mut builder = CreateEmbed::new()
        .title(&embed.title)
        .description(&embed.description)
        .color(embed.color)
        .author(author);
    if let Ok(timestamp) = Timestamp::from_unix_timestamp(embed.timestamp.timestamp()) {
        builder = builder.timestamp(timestamp);
    }
    builder
}

pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn send_reply(
        &self,
        channel: &Snowflake,
        reply_to: &Snowflake,
        text: &str,
    ) -> Result<()> {
        let channel = channel_id(channel)?;
        let builder = CreateMessage::new()
            .content(text)
            .reference_message((channel, message_id(reply_to)?));
        channel
            .send_message(&*self.http, builder)
            .await
            .map_err(|e| Error::external("send reply", e))?;
        Ok(())
    }

    async fn send_embed(&self, channel: &Snowflake, embed: &RelayEmbed) -> Result<()> {
        let builder = CreateMessage::new().embed(build_embed(embed));
        channel_id(channel)?
            .send_message(&*self.http, builder)
            .await
            .map_err(|e| Error::external("send relay embed", e))?;
        Ok(())
    }

    async fn channel_exists(&self, channel: &Snowflake) -> Result<bool> {
        let Some(id) = discord_id(channel) else {
            debug!(channel_id = %channel, "id outside discord range");
            return Ok(false);
        };
        match self.http.get_channel(ChannelId::new(id)).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_visible(&e) => Ok(false),
            Err(e) => Err(Error::external("look up channel", e)),
        }
    }

    async fn dm_channel(&self, user: &Snowflake) -> Result<Snowflake> {
        let dm = user_id(user)?
            .create_dm_channel(&*self.http)
            .await
            .map_err(|e| Error::external("open private channel", e))?;
        Ok(Snowflake::from(dm.id.get()))
    }

    async fn user_profile(&self, user: &Snowflake) -> Result<UserProfile> {
        let user = self
            .http
            .get_user(user_id(user)?)
            .await
            .map_err(|e| Error::external("look up user", e))?;
        Ok(UserProfile {
            avatar_url: Some(user.face()),
            name: user.name,
        })
    }
}
