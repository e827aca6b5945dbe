use std::collections::BTreeMap;

use {
    courier_common::Snowflake,
    serde::{Deserialize, Serialize},
};

/// One subscriber's channel list, in subscription order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub subscribed: Vec<Snowflake>,
}

impl SubscriptionRecord {
    pub fn contains(&self, channel: &Snowflake) -> bool {
        self.subscribed.contains(channel)
    }

    /// Append `channel` unless it is already present. Returns whether it was added.
    pub fn add(&mut self, channel: Snowflake) -> bool {
        if self.contains(&channel) {
            return false;
        }
        self.subscribed.push(channel);
        true
    }

    /// Drop every occurrence of `channel`. Returns how many were removed.
    pub fn remove_all(&mut self, channel: &Snowflake) -> usize {
        let before = self.subscribed.len();
        self.subscribed.retain(|c| c != channel);
        before - self.subscribed.len()
    }
}

/// The full subscription mapping, keyed by subscriber id.
///
/// Keys are kept exactly as they appear in the file. Records whose key is not
/// a platform id survive a load/save cycle untouched but never receive
/// relayed messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    records: BTreeMap<String, SubscriptionRecord>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: impl AsRef<str>) -> Option<&SubscriptionRecord> {
        self.records.get(user.as_ref())
    }

    /// The record for `user`, created empty if absent.
    pub fn record_mut(&mut self, user: impl AsRef<str>) -> &mut SubscriptionRecord {
        self.records.entry(user.as_ref().to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SubscriptionRecord)> {
        self.records.iter().map(|(user, record)| (user.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every subscriber whose list contains `channel`, in numeric id order.
    pub fn subscribers_of(&self, channel: &Snowflake) -> Vec<Snowflake> {
        let mut users: Vec<Snowflake> = self
            .records
            .iter()
            .filter(|(_, record)| record.contains(channel))
            .filter_map(|(user, _)| user.parse().ok())
            .collect();
        users.sort();
        users.dedup();
        users
    }
}
