//! End-to-end pipeline: fleet service + scripted connector, from operator
//! registration through command cycles and reply correlation into the
//! persisted statistics document.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use forage_runtime::{
    CycleConfig, EmbedField, FleetConfig, FleetService, InboundMessage, MemoryConnector,
    MemoryHandle, MessageEmbed,
};
use forage_store::StatsStore;

const GAME_BOT: &str = "game-bot";
const CHANNEL: &str = "chan-1";
const CREDENTIAL: &str = "credential-alpha-0001";

fn fleet(state_dir: &Path, connector: Arc<MemoryConnector>) -> FleetService {
    FleetService::new(
        FleetConfig {
            state_dir: state_dir.to_path_buf(),
            game_bot_id: GAME_BOT.to_string(),
            cycle: CycleConfig {
                commands: vec!["pls hunt".to_string(), "pls bal".to_string()],
                command_interval: Duration::from_millis(10),
                cycle_interval: Duration::from_millis(10_000),
            },
        },
        connector,
    )
    .expect("fleet service")
}

async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

async fn reply_to_own_send(handle: &MemoryHandle, body: &str, embeds: Vec<MessageEmbed>) {
    // Register the command the cycle just sent under a message id, then
    // deliver the game bot's reply referencing it.
    handle.insert_message(CHANNEL, "msg-1", &handle.identity().user_id, "pls bal");
    handle
        .inject(InboundMessage {
            author_id: GAME_BOT.to_string(),
            channel_id: CHANNEL.to_string(),
            body: body.to_string(),
            replied_to_message_id: Some("msg-1".to_string()),
            embeds,
        })
        .await;
}

#[tokio::test]
async fn integration_reply_flows_into_persisted_statistics() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let connector = Arc::new(MemoryConnector::new());
    connector.register_profile(CREDENTIAL, "user-1", "Forager One");
    let service = fleet(tempdir.path(), Arc::clone(&connector));

    service
        .add_account(CREDENTIAL, CHANNEL)
        .await
        .expect("add account");
    let handle = connector.handle(CREDENTIAL).expect("handle");
    wait_for("first cycle send", || !handle.sent().is_empty()).await;

    reply_to_own_send(
        &handle,
        "<:Coin:123> 1,500 <:Bank:456> 2,000",
        vec![MessageEmbed {
            description: "You caught a pest! **1 <:Mouse:7> Field Mouse**".to_string(),
            fields: vec![EmbedField {
                name: "Streak".to_string(),
                value: "3".to_string(),
            }],
        }],
    )
    .await;

    wait_for("statistics update", || {
        service
            .stats_snapshot()
            .stats
            .get(CREDENTIAL)
            .map(|record| record.last_total == 3_500)
            .unwrap_or(false)
    })
    .await;

    let record = service.stats_snapshot().stats[CREDENTIAL].clone();
    assert_eq!(record.name, "Forager One");
    assert_eq!(record.coins, 3_500);
    assert_eq!(record.animals, 1);
    assert_eq!(record.catches, 1);
    assert!(record.commands >= 1);

    service.stop_all().await;

    // The stats document survives the service; a fresh store sees the
    // same counters.
    let reopened = StatsStore::open(tempdir.path());
    assert_eq!(reopened.snapshot().stats[CREDENTIAL].coins, 3_500);
}

#[tokio::test]
async fn integration_monotonic_rule_spans_multiple_replies() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let connector = Arc::new(MemoryConnector::new());
    let service = fleet(tempdir.path(), Arc::clone(&connector));

    service
        .add_account(CREDENTIAL, CHANNEL)
        .await
        .expect("add account");
    let handle = connector.handle(CREDENTIAL).expect("handle");

    reply_to_own_send(&handle, "<:Coin:1> 1,000 <:Bank:2> 0", Vec::new()).await;
    wait_for("first reading", || {
        service.stats_snapshot().stats[CREDENTIAL].last_total == 1_000
    })
    .await;

    // A lower reading moves the watermark without counting a gain.
    reply_to_own_send(&handle, "<:Coin:1> 400 <:Bank:2> 0", Vec::new()).await;
    wait_for("second reading", || {
        service.stats_snapshot().stats[CREDENTIAL].last_total == 400
    })
    .await;
    assert_eq!(service.stats_snapshot().stats[CREDENTIAL].coins, 1_000);

    reply_to_own_send(&handle, "<:Coin:1> 900 <:Bank:2> 100", Vec::new()).await;
    wait_for("third reading", || {
        service.stats_snapshot().stats[CREDENTIAL].last_total == 1_000
    })
    .await;
    assert_eq!(service.stats_snapshot().stats[CREDENTIAL].coins, 1_600);

    service.stop_all().await;
}

#[tokio::test]
async fn integration_foreign_channel_replies_never_mutate_statistics() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let connector = Arc::new(MemoryConnector::new());
    let service = fleet(tempdir.path(), Arc::clone(&connector));

    service
        .add_account(CREDENTIAL, CHANNEL)
        .await
        .expect("add account");
    let handle = connector.handle(CREDENTIAL).expect("handle");
    handle.insert_message("chan-other", "msg-1", &handle.identity().user_id, "pls bal");
    handle
        .inject(InboundMessage {
            author_id: GAME_BOT.to_string(),
            channel_id: "chan-other".to_string(),
            body: "<:Coin:1> 9,999 <:Bank:2> 9,999".to_string(),
            replied_to_message_id: Some("msg-1".to_string()),
            embeds: Vec::new(),
        })
        .await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.stats_snapshot().stats[CREDENTIAL].last_total, 0);

    service.stop_all().await;
}

#[tokio::test]
async fn integration_removed_account_disappears_from_queries() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let connector = Arc::new(MemoryConnector::new());
    let service = fleet(tempdir.path(), Arc::clone(&connector));

    service
        .add_account(CREDENTIAL, CHANNEL)
        .await
        .expect("add account");
    service
        .add_account("credential-beta-0002", "chan-2")
        .await
        .expect("add second");
    assert_eq!(service.running_count().await, 2);

    service.remove_account(0).await.expect("remove");
    assert_eq!(service.running_count().await, 1);
    let snapshot = service.stats_snapshot();
    assert!(!snapshot.stats.contains_key(CREDENTIAL));
    assert!(snapshot.stats.contains_key("credential-beta-0002"));

    service.stop_all().await;
}
