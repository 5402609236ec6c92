use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use sitekeeper::backend::memory::MemoryStore;
use sitekeeper::backend::{Document, DocumentStore, Fields, RemoteError};
use sitekeeper::config::ConnectivityConfig;
use sitekeeper::connectivity::{ConnectivityProber, NetworkEvent};

const POLL: Duration = Duration::from_secs(30);
const TIMEOUT: Duration = Duration::from_secs(5);

/// Store whose ping never answers in time.
struct HangingStore;

#[async_trait]
impl DocumentStore for HangingStore {
    fn store_type(&self) -> &str {
        "hanging"
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn list(&self, _collection: &str) -> Result<Vec<Document>, RemoteError> {
        Err(RemoteError::Timeout)
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, RemoteError> {
        Err(RemoteError::Timeout)
    }

    async fn find_by_field(&self, _collection: &str, _field: &str, _value: &str) -> Result<Vec<Document>, RemoteError> {
        Err(RemoteError::Timeout)
    }

    async fn insert(&self, _collection: &str, _fields: Fields) -> Result<Document, RemoteError> {
        Err(RemoteError::Timeout)
    }

    async fn replace(&self, _collection: &str, _id: &str, _fields: Fields) -> Result<Document, RemoteError> {
        Err(RemoteError::Timeout)
    }

    async fn remove(&self, _collection: &str, _id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::Timeout)
    }
}

#[tokio::test]
async fn test_check_now_follows_store_reachability() {
    let store = Arc::new(MemoryStore::new());
    let prober = ConnectivityProber::new(store.clone(), &ConnectivityConfig::default());

    assert!(prober.check_now().await);
    store.set_online(false);
    assert!(!prober.check_now().await);
}

#[tokio::test(start_paused = true)]
async fn test_probe_timeout_reads_as_offline() {
    let prober = ConnectivityProber::with_timings(Arc::new(HangingStore), POLL, TIMEOUT);

    let start = tokio::time::Instant::now();
    assert!(!prober.check_now().await);
    assert!(start.elapsed() >= TIMEOUT);
    assert!(start.elapsed() < POLL);
}

#[tokio::test(start_paused = true)]
async fn test_prober_reports_initial_state() {
    let store = Arc::new(MemoryStore::new());
    let handle = ConnectivityProber::with_timings(store, POLL, TIMEOUT).spawn();
    let mut state = handle.subscribe();

    state.wait_for(|online| *online).await.unwrap();
    assert!(handle.is_online());
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_prober_polls_on_interval() {
    let store = Arc::new(MemoryStore::new());
    let handle = ConnectivityProber::with_timings(store.clone(), POLL, TIMEOUT).spawn();
    let mut state = handle.subscribe();
    state.wait_for(|online| *online).await.unwrap();

    let start = tokio::time::Instant::now();
    store.set_online(false);
    state.wait_for(|online| !*online).await.unwrap();
    assert!(start.elapsed() >= POLL);
    assert!(!handle.is_online());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_network_events_update_state() {
    let store = Arc::new(MemoryStore::new());
    let handle = ConnectivityProber::with_timings(store.clone(), POLL, TIMEOUT).spawn();
    let mut state = handle.subscribe();
    state.wait_for(|online| *online).await.unwrap();

    // Offline is trusted without probing, even though the store still answers
    let calls = store.call_count();
    handle.notify(NetworkEvent::Offline);
    state.wait_for(|online| !*online).await.unwrap();
    assert_eq!(store.call_count(), calls);

    handle.notify(NetworkEvent::Online);
    state.wait_for(|online| *online).await.unwrap();
    assert_eq!(store.call_count(), calls + 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_online_event_still_probes() {
    let store = Arc::new(MemoryStore::new());
    store.set_online(false);
    let handle = ConnectivityProber::with_timings(store.clone(), POLL, TIMEOUT).spawn();
    let mut state = handle.subscribe();
    state.changed().await.unwrap();
    assert!(!*state.borrow_and_update());

    handle.notify(NetworkEvent::Online);
    state.changed().await.unwrap();
    assert!(!*state.borrow_and_update());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_loop() {
    let store = Arc::new(MemoryStore::new());
    let handle = ConnectivityProber::with_timings(store.clone(), POLL, TIMEOUT).spawn();
    let mut state = handle.subscribe();
    state.wait_for(|online| *online).await.unwrap();

    handle.shutdown().await;
    let calls = store.call_count();
    tokio::time::sleep(POLL * 3).await;

    assert_eq!(store.call_count(), calls);
    assert!(state.changed().await.is_err());
}
