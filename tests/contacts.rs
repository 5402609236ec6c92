use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use sitekeeper::backend::memory::MemoryStore;
use sitekeeper::constants::KEY_CONTACT_SUBMISSIONS;
use sitekeeper::models::{ContactSubmission, Record, RecordId};
use sitekeeper::notify::Notifier;
use sitekeeper::storage::{KeyValueStore, MemoryKeyValueStore};
use sitekeeper::sync::SiteData;

struct ChannelNotifier(mpsc::UnboundedSender<Record<ContactSubmission>>);

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify_submission(&self, submission: &Record<ContactSubmission>) -> anyhow::Result<()> {
        self.0.send(submission.clone()).map_err(|_| anyhow!("receiver closed"))
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_submission(&self, _submission: &Record<ContactSubmission>) -> anyhow::Result<()> {
        Err(anyhow!("email provider rejected the message"))
    }
}

fn submission() -> ContactSubmission {
    ContactSubmission::new("Eve", "eve@example.com", "Hello there")
}

#[tokio::test]
async fn test_mark_as_read_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let site = SiteData::new(store.clone(), Arc::new(MemoryKeyValueStore::new()));
    let added = site.contacts.add(submission()).await.into_inner();
    assert!(added.data.is_new);

    let first = site.contacts.mark_as_read(&added.id).await;
    assert!(first.is_remote());
    assert!(!first.value.as_ref().unwrap().data.is_new);

    let second = site.contacts.mark_as_read(&added.id).await;
    assert!(second.is_remote());
    assert!(!second.value.unwrap().data.is_new);

    assert_eq!(store.documents(KEY_CONTACT_SUBMISSIONS)[0].fields["isNew"], false);
    assert!(!site.contacts.cache().get().await[0].data.is_new);
}

#[tokio::test]
async fn test_mark_as_read_offline_updates_cache() {
    let store = Arc::new(MemoryStore::new());
    let site = SiteData::new(store.clone(), Arc::new(MemoryKeyValueStore::new()));
    store.set_online(false);
    let added = site.contacts.add(submission()).await.into_inner();

    for _ in 0..2 {
        let outcome = site.contacts.mark_as_read(&added.id).await;
        assert!(outcome.is_local());
        assert!(!outcome.value.unwrap().data.is_new);
    }
    assert!(!site.contacts.cache().get().await[0].data.is_new);
}

#[tokio::test]
async fn test_mark_as_read_offline_keeps_other_fields() {
    let store = Arc::new(MemoryStore::new());
    let kv = Arc::new(MemoryKeyValueStore::new());
    let site = SiteData::new(store.clone(), kv.clone());
    store.set_online(false);
    kv.set_item(
        KEY_CONTACT_SUBMISSIONS,
        r#"[{"id":1,"name":"Eve","email":"eve@example.com","message":"Hi","date":"2024-01-02T03:04:05Z","isNew":true,"source":"form"},{"id":2,"name":"Old"}]"#,
    )
    .await
    .unwrap();

    let outcome = site.contacts.mark_as_read(&RecordId::from(1u64)).await;
    assert!(!outcome.value.unwrap().data.is_new);

    let raw = kv.get_item(KEY_CONTACT_SUBMISSIONS).await.unwrap().unwrap();
    let items: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["isNew"], false);
    assert_eq!(items[0]["source"], "form");
    assert_eq!(items[1]["name"], "Old");
}

#[tokio::test]
async fn test_mark_as_read_unknown_id() {
    let site = SiteData::new(Arc::new(MemoryStore::new()), Arc::new(MemoryKeyValueStore::new()));

    let outcome = site.contacts.mark_as_read(&RecordId::new("nope")).await;
    assert!(outcome.is_local());
    assert!(outcome.value.is_none());
}

#[tokio::test]
async fn test_locally_minted_submission_marked_read_while_remote_is_back() {
    let store = Arc::new(MemoryStore::new());
    let site = SiteData::new(store.clone(), Arc::new(MemoryKeyValueStore::new()));
    store.set_online(false);
    let added = site.contacts.add(submission()).await.into_inner();
    store.set_online(true);

    // The remote store never saw the local id, so the cache serves the call
    let outcome = site.contacts.mark_as_read(&added.id).await;
    assert!(outcome.is_local());
    assert_eq!(outcome.value.unwrap().id, added.id);
}

#[tokio::test]
async fn test_submit_notifies_in_background() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let site = SiteData::with_notifier(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(ChannelNotifier(tx)),
    );

    let mut message = submission();
    message.is_new = false;
    let stored = site.submit_contact(message).await;
    assert!(stored.is_remote());
    assert!(stored.value.data.is_new);

    let notified = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notification not delivered")
        .expect("channel closed");
    assert_eq!(notified, stored.value);
}

#[tokio::test]
async fn test_submit_offline_still_notifies() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let store = Arc::new(MemoryStore::new());
    store.set_online(false);
    let site = SiteData::with_notifier(store, Arc::new(MemoryKeyValueStore::new()), Arc::new(ChannelNotifier(tx)));

    let stored = site.submit_contact(submission()).await;
    assert!(stored.is_local());
    assert_eq!(stored.value.id.as_str(), "1");

    let notified = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert_eq!(notified.id, stored.value.id);
}

#[tokio::test]
async fn test_failed_notification_keeps_submission() {
    let store = Arc::new(MemoryStore::new());
    let site = SiteData::with_notifier(store.clone(), Arc::new(MemoryKeyValueStore::new()), Arc::new(FailingNotifier));

    let stored = site.submit_contact(submission()).await;
    tokio::task::yield_now().await;

    assert!(stored.is_remote());
    assert_eq!(store.len(KEY_CONTACT_SUBMISSIONS), 1);
    assert_eq!(site.contacts.get_all().await.value, vec![stored.value]);
}
