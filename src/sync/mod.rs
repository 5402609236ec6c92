//! Write-through repositories with local fallback.
//!
//! This module provides [`Repository`], the data layer every collection goes
//! through, and [`SiteData`], which bundles the four content repositories of
//! the site around one shared [`SessionContext`].
//!
//! Every operation tries the remote store first. On success the local cache is
//! refreshed so it mirrors the remote collection; on any remote failure the
//! same operation is carried out against the cache alone. Operations never
//! return errors: the [`Outcome`] reports where the value came from instead.
//!
//! # Example
//! ```rust,no_run
//! use sitekeeper::backend::memory::MemoryStore;
//! use sitekeeper::models::TeamMember;
//! use sitekeeper::storage::MemoryKeyValueStore;
//! use sitekeeper::sync::SiteData;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let site = SiteData::new(Arc::new(MemoryStore::new()), Arc::new(MemoryKeyValueStore::new()));
//!
//! let added = site.team_members.add(TeamMember::new("Ann", "Lead")).await;
//! if let Some(advisory) = added.advisory() {
//!     println!("{advisory}");
//! }
//!
//! let members = site.team_members.get_all().await.into_inner();
//! # }
//! ```

pub mod contacts;
pub mod context;

pub use context::SessionContext;

use log::{debug, warn};
use std::sync::Arc;

use crate::backend::{DocumentStore, RemoteCollection, RemoteError};
use crate::constants::{ADVISORY_SAVED_LOCALLY, ADVISORY_SHOWING_CACHED};
use crate::models::{ContactSubmission, Entity, Project, Record, RecordId, Service, TeamMember};
use crate::notify::{LogNotifier, Notifier};
use crate::storage::{CacheSnapshot, KeyValueStore, LocalCache};

/// Where the value of an [`Outcome`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The remote store served the operation.
    Remote,
    /// The remote call failed and the local cache served the operation.
    LocalFallback {
        /// Remote failure that caused the fallback
        reason: String,
        /// User-facing notice for this fallback
        advisory: &'static str,
    },
}

/// Result of a repository operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Outcome<T> {
    pub fn remote(value: T) -> Self {
        Self {
            value,
            origin: Origin::Remote,
        }
    }

    pub fn local(value: T, reason: impl Into<String>, advisory: &'static str) -> Self {
        Self {
            value,
            origin: Origin::LocalFallback {
                reason: reason.into(),
                advisory,
            },
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.origin, Origin::Remote)
    }

    pub fn is_local(&self) -> bool {
        !self.is_remote()
    }

    /// Notice to show the user, present only for fallbacks.
    pub fn advisory(&self) -> Option<&'static str> {
        match &self.origin {
            Origin::Remote => None,
            Origin::LocalFallback { advisory, .. } => Some(*advisory),
        }
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            origin: self.origin,
        }
    }
}

/// Repository of one entity collection.
///
/// Cloning is cheap; clones share the store, the cache and the session context.
pub struct Repository<E> {
    remote: RemoteCollection<E>,
    cache: LocalCache<E>,
    context: Arc<SessionContext>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            cache: self.cache.clone(),
            context: Arc::clone(&self.context),
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>, kv: Arc<dyn KeyValueStore>, context: Arc<SessionContext>) -> Self {
        Self {
            remote: RemoteCollection::new(store),
            cache: LocalCache::new(kv),
            context,
        }
    }

    pub fn cache(&self) -> &LocalCache<E> {
        &self.cache
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// All records of the collection.
    ///
    /// A successful remote read overwrites the cache, including with an empty
    /// list. Otherwise the cached records are returned.
    pub async fn get_all(&self) -> Outcome<Vec<Record<E>>> {
        match self.remote.list_all().await {
            Ok(records) => {
                self.cache.set(&records).await;
                Outcome::remote(records)
            }
            Err(e) => {
                let reason = self.fallback_reason("get_all", &e);
                Outcome::local(self.cache.get().await, reason, ADVISORY_SHOWING_CACHED)
            }
        }
    }

    /// Store a new record and return it with its id.
    ///
    /// Remote inserts get a store-minted id. The fallback mints the next
    /// integer id of the cached collection.
    pub async fn add(&self, data: E) -> Outcome<Record<E>> {
        match self.remote.insert(&data).await {
            Ok(record) => {
                let added = record.clone();
                self.write_through(move |cached| cached.push(&added)).await;
                Outcome::remote(record)
            }
            Err(e) => {
                let reason = self.fallback_reason("add", &e);
                let mut cached = self.cache.snapshot().await;
                let record = Record::new(cached.next_local_id(), data);
                cached.push(&record);
                self.cache.store(&cached).await;
                Outcome::local(record, reason, ADVISORY_SAVED_LOCALLY)
            }
        }
    }

    /// Overwrite the record with the given id.
    ///
    /// The returned record echoes the input even when the fallback found no
    /// cached record with that id.
    pub async fn update(&self, id: &RecordId, data: E) -> Outcome<Record<E>> {
        match self.remote.replace(id, &data).await {
            Ok(record) => {
                let updated = record.clone();
                self.write_through(move |cached| cached.upsert(&updated)).await;
                Outcome::remote(record)
            }
            Err(e) => {
                let reason = self.fallback_reason("update", &e);
                let record = Record::new(id.clone(), data);
                let mut cached = self.cache.snapshot().await;
                if cached.replace(&record) {
                    self.cache.store(&cached).await;
                } else {
                    debug!("{} {id} not in local cache, nothing to update", E::COLLECTION);
                }
                Outcome::local(record, reason, ADVISORY_SAVED_LOCALLY)
            }
        }
    }

    /// Delete the record with the given id. Always reports `true`.
    pub async fn delete(&self, id: &RecordId) -> Outcome<bool> {
        match self.remote.remove(id).await {
            Ok(()) => {
                let removed = id.clone();
                self.write_through(move |cached| {
                    cached.remove(&removed);
                })
                .await;
                Outcome::remote(true)
            }
            Err(e) => {
                let reason = self.fallback_reason("delete", &e);
                let mut cached = self.cache.snapshot().await;
                if cached.remove(id) {
                    self.cache.store(&cached).await;
                }
                Outcome::local(true, reason, ADVISORY_SAVED_LOCALLY)
            }
        }
    }

    /// Refresh the cache after a successful remote write.
    ///
    /// Re-reads the remote collection; if that read fails, applies `patch` to
    /// the cached snapshot instead so the write is still reflected locally.
    async fn write_through<F>(&self, patch: F)
    where
        F: FnOnce(&mut CacheSnapshot<E>),
    {
        match self.remote.list_all().await {
            Ok(records) => self.cache.set(&records).await,
            Err(e) => {
                warn!(
                    "⚠️  Could not re-read {} after write, patching local cache: {e}",
                    E::COLLECTION
                );
                let mut cached = self.cache.snapshot().await;
                patch(&mut cached);
                self.cache.store(&cached).await;
            }
        }
    }

    /// Report a fallback to the session and describe its cause.
    pub(crate) fn fallback_reason(&self, operation: &str, error: &RemoteError) -> String {
        self.context.record_fallback(E::COLLECTION, operation, error);
        error.to_string()
    }
}

pub type TeamMemberRepository = Repository<TeamMember>;
pub type ProjectRepository = Repository<Project>;
pub type ServiceRepository = Repository<Service>;
pub type ContactRepository = Repository<ContactSubmission>;

/// The four content repositories of the site, sharing one session context.
#[derive(Clone)]
pub struct SiteData {
    pub team_members: TeamMemberRepository,
    pub projects: ProjectRepository,
    pub services: ServiceRepository,
    pub contacts: ContactRepository,
    context: Arc<SessionContext>,
    notifier: Arc<dyn Notifier>,
}

impl SiteData {
    pub fn new(store: Arc<dyn DocumentStore>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_notifier(store, kv, Arc::new(LogNotifier))
    }

    pub fn with_notifier(store: Arc<dyn DocumentStore>, kv: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let context = Arc::new(SessionContext::new());
        Self {
            team_members: Repository::new(Arc::clone(&store), Arc::clone(&kv), Arc::clone(&context)),
            projects: Repository::new(Arc::clone(&store), Arc::clone(&kv), Arc::clone(&context)),
            services: Repository::new(Arc::clone(&store), Arc::clone(&kv), Arc::clone(&context)),
            contacts: Repository::new(store, kv, Arc::clone(&context)),
            context,
            notifier,
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Store a contact form submission and notify about it in the background.
    pub async fn submit_contact(&self, submission: ContactSubmission) -> Outcome<Record<ContactSubmission>> {
        self.contacts.submit(submission, Arc::clone(&self.notifier)).await
    }
}
