use time::macros::datetime;

use super::*;
use crate::chat::{MessageContent, MessageKind};

fn row(id: &str, channel_id: &str, status: MessageStatus) -> Message {
    Message {
        id: id.into(),
        channel_id: channel_id.into(),
        content: MessageContent::from("invoice #42 approved"),
        sender_id: 2,
        created_at: datetime!(2026-02-10 12:00 UTC),
        status,
        kind: MessageKind::System,
    }
}

// =============================================================================
// select / insert
// =============================================================================

#[tokio::test]
async fn select_filters_channel_and_sorts() {
    let store = InMemoryRecordStore::new();
    let mut late = row("late", "ops", MessageStatus::Sent);
    late.created_at = datetime!(2026-02-10 13:00 UTC);
    store.seed([late, row("other", "sales", MessageStatus::Sent), row("early", "ops", MessageStatus::Sent)]);

    let rows = store.select_messages("ops").await.unwrap();
    let ids = rows.iter().map(|m| m.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, ["early", "late"]);
}

#[tokio::test]
async fn insert_stores_as_sent_under_same_id() {
    let store = InMemoryRecordStore::new();
    let stored = store.insert_message(&row("p-1", "ops", MessageStatus::Sending)).await.unwrap();
    assert_eq!(stored.id, "p-1");
    assert_eq!(stored.status, MessageStatus::Sent);
    assert_eq!(store.select_messages("ops").await.unwrap(), vec![stored]);
}

#[tokio::test]
async fn insert_rejects_duplicate_id() {
    let store = InMemoryRecordStore::new();
    store.insert_message(&row("p-1", "ops", MessageStatus::Sending)).await.unwrap();
    let err = store.insert_message(&row("p-1", "ops", MessageStatus::Sending)).await.unwrap_err();
    assert!(err.to_string().contains("duplicate id p-1"));
}

#[tokio::test]
async fn failure_switches() {
    let store = InMemoryRecordStore::new();
    store.set_fail_inserts(true);
    store.set_fail_selects(true);
    assert!(matches!(store.insert_message(&row("a", "ops", MessageStatus::Sending)).await, Err(StoreError::Unavailable(_))));
    assert!(matches!(store.select_messages("ops").await, Err(StoreError::Unavailable(_))));

    store.set_fail_inserts(false);
    store.set_fail_selects(false);
    assert!(store.insert_message(&row("a", "ops", MessageStatus::Sending)).await.is_ok());
    assert_eq!(store.select_messages("ops").await.unwrap().len(), 1);
}

// =============================================================================
// feed
// =============================================================================

#[tokio::test]
async fn subscribers_receive_only_their_channel() {
    let store = InMemoryRecordStore::new();
    let mut ops = store.subscribe_inserts("ops").await.unwrap();
    let mut sales = store.subscribe_inserts("sales").await.unwrap();

    store.insert_message(&row("o", "ops", MessageStatus::Sending)).await.unwrap();
    store.publish(row("s", "sales", MessageStatus::Sent));

    assert_eq!(ops.recv().await.unwrap().id, "o");
    assert_eq!(sales.recv().await.unwrap().id, "s");
    assert!(ops.try_recv().is_err());
}

#[tokio::test]
async fn deliver_does_not_store() {
    let store = InMemoryRecordStore::new();
    let mut ops = store.subscribe_inserts("ops").await.unwrap();
    store.deliver(row("ghost", "ops", MessageStatus::Sent));
    assert_eq!(ops.recv().await.unwrap().id, "ghost");
    assert!(store.select_messages("ops").await.unwrap().is_empty());
}

#[tokio::test]
async fn dropped_receivers_are_pruned() {
    let store = InMemoryRecordStore::new();
    let rx = store.subscribe_inserts("ops").await.unwrap();
    assert_eq!(store.subscriber_count("ops"), 1);
    drop(rx);
    assert_eq!(store.subscriber_count("ops"), 0);
    store.publish(row("a", "ops", MessageStatus::Sent));
    assert!(store.lock().subscribers.is_empty());
}

#[tokio::test]
async fn full_queue_drops_delivery_but_keeps_subscriber() {
    let store = InMemoryRecordStore::with_feed_buffer(1);
    let mut rx = store.subscribe_inserts("ops").await.unwrap();
    store.publish(row("a", "ops", MessageStatus::Sent));
    store.publish(row("b", "ops", MessageStatus::Sent));

    assert_eq!(rx.recv().await.unwrap().id, "a");
    assert!(rx.try_recv().is_err());
    assert_eq!(store.subscriber_count("ops"), 1);
}
