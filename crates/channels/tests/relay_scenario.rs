#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{collections::HashSet, sync::Arc, time::Duration};

use {
    chrono::Utc,
    courier_channels::{
        ChatPlatform, Dispatch, InboundMessage, Pipeline, RelaySettings,
        recording::RecordingPlatform, relay_pipeline,
    },
    courier_common::Snowflake,
    courier_store::{FileStore, SubscriptionStore, Subscriptions},
    tempfile::TempDir,
};

const USER: &str = "1000";
const OTHER_USER: &str = "2000";
const WATCHED: &str = "123";
const COMMANDS: &str = "124";

fn id(s: &str) -> Snowflake {
    s.parse().unwrap()
}

fn message(author: &str, channel: &str, content: &str) -> InboundMessage {
    InboundMessage {
        id: id("555"),
        channel_id: id(channel),
        author_id: id(author),
        from_self: false,
        author_is_bot: false,
        content: content.to_string(),
        timestamp: Utc::now(),
    }
}

struct Relay {
    _dir: TempDir,
    path: std::path::PathBuf,
    platform: Arc<RecordingPlatform>,
    pipeline: Pipeline,
}

fn relay(platform: RecordingPlatform) -> Relay {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("subscriptions.json");
    let platform = Arc::new(platform);
    let store = Arc::new(FileStore::new(&path)) as Arc<dyn SubscriptionStore>;
    let pipeline = relay_pipeline(
        Arc::clone(&platform) as Arc<dyn ChatPlatform>,
        Arc::new(Subscriptions::new(store)),
        Arc::new(HashSet::from([id(WATCHED), id(COMMANDS)])),
        RelaySettings {
            lookup_timeout: Duration::from_millis(200),
            delivery_timeout: Duration::from_millis(200),
            ..RelaySettings::default()
        },
    );
    Relay {
        _dir: dir,
        path,
        platform,
        pipeline,
    }
}

fn stored(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn subscribe_reject_then_relay() {
    let r = relay(
        RecordingPlatform::new()
            .with_channel(WATCHED)
            .with_profile(OTHER_USER, "bob", Some("https://cdn.example/bob.png")),
    );

    r.pipeline
        .dispatch(&message(USER, COMMANDS, "!sub 123"))
        .await
        .unwrap();
    assert_eq!(
        stored(&r.path),
        serde_json::json!({ USER: { "subscribed": [WATCHED] } })
    );
    assert_eq!(r.platform.replies()[0].text, "Subscribed to <#123>.");

    r.pipeline
        .dispatch(&message(USER, COMMANDS, "!sub abc"))
        .await
        .unwrap();
    assert_eq!(
        stored(&r.path),
        serde_json::json!({ USER: { "subscribed": [WATCHED] } })
    );
    assert!(r.platform.replies()[1].text.contains("`abc`"));

    let outcome = r
        .pipeline
        .dispatch(&message(OTHER_USER, WATCHED, "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, Dispatch::StoppedBy("fan-out".into()));

    let embeds = r.platform.embeds();
    assert_eq!(embeds.len(), 1);
    let (dm, embed) = &embeds[0];
    assert_eq!(*dm, RecordingPlatform::dm_channel_for(&id(USER)));
    assert_eq!(embed.description, "hello");
    assert_eq!(embed.title, "<#123>");
    assert_eq!(embed.author_name, "bob");
}

#[tokio::test]
async fn bot_messages_never_mutate_or_relay() {
    let r = relay(RecordingPlatform::new().with_channel(WATCHED));
    r.pipeline
        .dispatch(&message(USER, COMMANDS, "!sub 123"))
        .await
        .unwrap();
    let before = stored(&r.path);

    let mut from_bot = message(OTHER_USER, WATCHED, "!sub 123");
    from_bot.author_is_bot = true;
    r.pipeline.dispatch(&from_bot).await.unwrap();

    let mut own = message(OTHER_USER, WATCHED, "hello");
    own.from_self = true;
    own.author_is_bot = true;
    r.pipeline.dispatch(&own).await.unwrap();

    assert_eq!(stored(&r.path), before);
    assert!(r.platform.embeds().is_empty());
    assert_eq!(r.platform.replies().len(), 1);
}

#[tokio::test]
async fn unmonitored_channels_are_ignored() {
    let r = relay(RecordingPlatform::new().with_channel(WATCHED));
    r.pipeline
        .dispatch(&message(USER, COMMANDS, "!sub 123"))
        .await
        .unwrap();

    let outcome = r
        .pipeline
        .dispatch(&message(OTHER_USER, "777", "hello"))
        .await
        .unwrap();
    assert_eq!(outcome, Dispatch::StoppedBy("scope-filter".into()));
    assert!(r.platform.embeds().is_empty());
}

#[tokio::test]
async fn failing_subscriber_does_not_starve_others() {
    let r = relay(RecordingPlatform::new().with_channel(WATCHED));
    for user in ["1", "2", "3"] {
        r.pipeline
            .dispatch(&message(user, COMMANDS, "!sub 123"))
            .await
            .unwrap();
    }
    r.platform.fail_deliveries_to(&id("2"));
    r.platform.hang_deliveries_to(&id("3"));

    r.pipeline
        .dispatch(&message(OTHER_USER, WATCHED, "hello"))
        .await
        .unwrap();

    let embeds = r.platform.embeds();
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0].0, RecordingPlatform::dm_channel_for(&id("1")));
}

#[tokio::test]
async fn unwritable_store_sends_no_confirmation() {
    let r = relay(RecordingPlatform::new().with_channel(WATCHED));
    std::fs::create_dir_all(&r.path).unwrap();

    let err = r
        .pipeline
        .dispatch(&message(USER, COMMANDS, "!sub 123"))
        .await
        .unwrap_err();
    assert!(err.is_storage());
    assert!(r.platform.replies().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commands_are_all_kept() {
    let mut platform = RecordingPlatform::new();
    for channel in 1..=16 {
        platform = platform.with_channel(&channel.to_string());
    }
    let r = Arc::new(relay(platform));

    let tasks: Vec<_> = (1..=16)
        .map(|channel| {
            let r = Arc::clone(&r);
            tokio::spawn(async move {
                r.pipeline
                    .dispatch(&message(USER, COMMANDS, &format!("!sub {channel}")))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let doc = stored(&r.path);
    assert_eq!(doc[USER]["subscribed"].as_array().unwrap().len(), 16);
}
