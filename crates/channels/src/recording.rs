//! Test double: a scripted [`ChatPlatform`] that records every outbound call.
//!
//! Nothing in the relay itself uses it. It is public so the crate's
//! integration tests, and anything embedding the relay, can drive the
//! pipeline without a live gateway.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, courier_common::Snowflake, futures::future::pending};

use crate::{
    Error, Result,
    platform::{ChatPlatform, RelayEmbed, UserProfile},
};

/// A reply posted through [`ChatPlatform::send_reply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedReply {
    pub channel: Snowflake,
    pub reply_to: Snowflake,
    pub text: String,
}

#[derive(Default)]
pub struct RecordingPlatform {
    channels: HashSet<Snowflake>,
    profiles: HashMap<Snowflake, UserProfile>,
    failing_users: Mutex<HashSet<Snowflake>>,
    hanging_users: Mutex<HashSet<Snowflake>>,
    fail_lookups: AtomicBool,
    hang_lookups: AtomicBool,
    fail_replies: AtomicBool,
    channel_checks: AtomicUsize,
    profile_lookups: AtomicUsize,
    replies: Mutex<Vec<RecordedReply>>,
    embeds: Mutex<Vec<(Snowflake, RelayEmbed)>>,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn snowflake(id: &str) -> Snowflake {
    id.parse().unwrap_or_else(|_| Snowflake::from(0))
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `channel_exists` report `id` as present.
    pub fn with_channel(mut self, id: &str) -> Self {
        self.channels.insert(snowflake(id));
        self
    }

    pub fn with_profile(mut self, user: &str, name: &str, avatar_url: Option<&str>) -> Self {
        self.profiles.insert(snowflake(user), UserProfile {
            name: name.to_string(),
            avatar_url: avatar_url.map(str::to_string),
        });
        self
    }

    /// Fail `channel_exists` and `user_profile` calls.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::Relaxed);
    }

    /// Never complete `channel_exists` and `user_profile` calls.
    pub fn hang_lookups(&self, hang: bool) {
        self.hang_lookups.store(hang, Ordering::Relaxed);
    }

    pub fn fail_replies(&self, fail: bool) {
        self.fail_replies.store(fail, Ordering::Relaxed);
    }

    /// Fail every DM delivery to `user`.
    pub fn fail_deliveries_to(&self, user: &Snowflake) {
        lock(&self.failing_users).insert(user.clone());
    }

    /// Never complete DM deliveries to `user`.
    pub fn hang_deliveries_to(&self, user: &Snowflake) {
        lock(&self.hanging_users).insert(user.clone());
    }

    /// The DM channel id this platform hands out for `user`.
    pub fn dm_channel_for(user: &Snowflake) -> Snowflake {
        snowflake(&format!("8{user}"))
    }

    fn user_for_dm(dm: &Snowflake) -> Option<Snowflake> {
        dm.as_str().strip_prefix('8')?.parse().ok()
    }

    pub fn replies(&self) -> Vec<RecordedReply> {
        lock(&self.replies).clone()
    }

    pub fn embeds(&self) -> Vec<(Snowflake, RelayEmbed)> {
        lock(&self.embeds).clone()
    }

    pub fn channel_checks(&self) -> usize {
        self.channel_checks.load(Ordering::Relaxed)
    }

    pub fn profile_lookups(&self) -> usize {
        self.profile_lookups.load(Ordering::Relaxed)
    }

    async fn lookup_gate(&self) -> Result<()> {
        if self.hang_lookups.load(Ordering::Relaxed) {
            pending::<()>().await;
        }
        if self.fail_lookups.load(Ordering::Relaxed) {
            return Err(Error::unavailable("lookup refused by recording platform"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn send_reply(
        &self,
        channel: &Snowflake,
        reply_to: &Snowflake,
        text: &str,
    ) -> Result<()> {
        if self.fail_replies.load(Ordering::Relaxed) {
            return Err(Error::unavailable("reply refused by recording platform"));
        }
        lock(&self.replies).push(RecordedReply {
            channel: channel.clone(),
            reply_to: reply_to.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_embed(&self, channel: &Snowflake, embed: &RelayEmbed) -> Result<()> {
        if let Some(user) = Self::user_for_dm(channel) {
            let hangs = lock(&self.hanging_users).contains(&user);
            if hangs {
                pending::<()>().await;
            }
            let fails = lock(&self.failing_users).contains(&user);
            if fails {
                return Err(Error::unavailable(format!("cannot message user {user}")));
            }
        }
        lock(&self.embeds).push((channel.clone(), embed.clone()));
        Ok(())
    }

    async fn channel_exists(&self, channel: &Snowflake) -> Result<bool> {
        self.channel_checks.fetch_add(1, Ordering::Relaxed);
        self.lookup_gate().await?;
        Ok(self.channels.contains(channel))
    }

    async fn dm_channel(&self, user: &Snowflake) -> Result<Snowflake> {
        Ok(Self::dm_channel_for(user))
    }

    async fn user_profile(&self, user: &Snowflake) -> Result<UserProfile> {
        self.profile_lookups.fetch_add(1, Ordering::Relaxed);
        self.lookup_gate().await?;
        self.profiles
            .get(user)
            .cloned()
            .ok_or_else(|| Error::unavailable(format!("unknown user {user}")))
    }
}
