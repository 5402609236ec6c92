use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::backend::RemoteError;
use crate::constants::LOG_REMOTE_UNREACHABLE;
use crate::models::Collection;

/// Per-session state shared by the repositories of one [`super::SiteData`].
///
/// Tracks whether the "remote unreachable" notice was already emitted, so it
/// is reported once per session instead of once per call.
#[derive(Debug, Default)]
pub struct SessionContext {
    remote_failure_reported: AtomicBool,
    fallbacks: AtomicUsize,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an operation fell back to the local cache.
    pub fn record_fallback(&self, collection: Collection, operation: &str, error: &RemoteError) {
        self.fallbacks.fetch_add(1, Ordering::SeqCst);
        if self.remote_failure_reported.swap(true, Ordering::SeqCst) {
            debug!("{collection}.{operation} served from local cache: {error}");
        } else {
            warn!("{LOG_REMOTE_UNREACHABLE} ({collection}.{operation}: {error})");
        }
    }

    /// Whether the unreachable notice has been emitted in this session.
    pub fn remote_failure_reported(&self) -> bool {
        self.remote_failure_reported.load(Ordering::SeqCst)
    }

    /// Number of operations served locally in this session.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.remote_failure_reported.store(false, Ordering::SeqCst);
        self.fallbacks.store(0, Ordering::SeqCst);
    }
}
