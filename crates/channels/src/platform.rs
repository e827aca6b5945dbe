use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    courier_common::Snowflake,
    serde::Serialize,
};

use crate::{Result, message::InboundMessage};

/// Embed colour used for relayed messages.
pub const RELAY_COLOR: u32 = 0x0088_8888;

/// Display data for a message author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Stand-in used when the author cannot be looked up.
    pub fn unknown(user: &Snowflake) -> Self {
        Self {
            name: user.to_string(),
            avatar_url: None,
        }
    }
}

/// A relayed copy of a channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayEmbed {
    /// Channel mention, e.g. `<#123>`.
    pub title: String,
    pub description: String,
    pub author_name: String,
    pub author_icon_url: Option<String>,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
}

impl RelayEmbed {
    pub fn for_message(message: &InboundMessage, author: &UserProfile) -> Self {
        Self {
            title: channel_mention(&message.channel_id),
            description: message.content.clone(),
            author_name: author.name.clone(),
            author_icon_url: author.avatar_url.clone(),
            color: RELAY_COLOR,
            timestamp: message.timestamp,
        }
    }
}

/// `<#id>`, rendered by clients as a link to the channel.
pub fn channel_mention(channel: &Snowflake) -> String {
    format!("<#{channel}>")
}

/// Everything the relay core needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Post `text` in `channel` as a reply to message `reply_to`.
    async fn send_reply(&self, channel: &Snowflake, reply_to: &Snowflake, text: &str)
    -> Result<()>;

    /// Post a relay embed in `channel` (usually a DM channel).
    async fn send_embed(&self, channel: &Snowflake, embed: &RelayEmbed) -> Result<()>;

    /// Whether `channel` exists and is visible to the bot.
    async fn channel_exists(&self, channel: &Snowflake) -> Result<bool>;

    /// The private channel used to reach `user`, opened if necessary.
    async fn dm_channel(&self, user: &Snowflake) -> Result<Snowflake>;

    /// Name and avatar of `user`.
    async fn user_profile(&self, user: &Snowflake) -> Result<UserProfile>;
}
