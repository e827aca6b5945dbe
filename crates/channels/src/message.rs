use {
    chrono::{DateTime, Utc},
    courier_common::Snowflake,
};

/// A message-create event, as delivered by the gateway.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    /// Posted by this bot's own account.
    pub from_self: bool,
    /// Posted by any bot account (ours included).
    pub author_is_bot: bool,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
