//! One-shot copy of the local cache into the remote store.
//!
//! Purely additive: nothing is deleted on either side. An item is skipped when
//! the remote collection already holds a document with the same natural key,
//! which makes re-running safe but is only a heuristic (two team members with
//! the same name collide). Concurrent runs are not serialized.

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::backend::{DocumentStore, RemoteCollection, RemoteError};
use crate::models::{Collection, ContactSubmission, Entity, Project, Record, Service, TeamMember};
use crate::storage::{KeyValueStore, LocalCache};

/// Counters of one migrated collection.
///
/// `total` counts every cached element, including ones that no longer decode
/// (those count as `failed`), and `success` only the inserted ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationCount {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub team_members: MigrationCount,
    pub projects: MigrationCount,
    pub services: MigrationCount,
    pub contact_submissions: MigrationCount,
}

impl MigrationReport {
    pub fn get(&self, collection: Collection) -> &MigrationCount {
        match collection {
            Collection::TeamMembers => &self.team_members,
            Collection::Projects => &self.projects,
            Collection::Services => &self.services,
            Collection::ContactSubmissions => &self.contact_submissions,
        }
    }

    pub fn total_success(&self) -> usize {
        Collection::ALL.iter().map(|c| self.get(*c).success).sum()
    }

    pub fn total_failed(&self) -> usize {
        Collection::ALL.iter().map(|c| self.get(*c).failed).sum()
    }
}

enum ItemResult {
    Inserted,
    AlreadyPresent,
}

pub struct Migrator {
    store: Arc<dyn DocumentStore>,
    kv: Arc<dyn KeyValueStore>,
}

impl Migrator {
    pub fn new(store: Arc<dyn DocumentStore>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self { store, kv }
    }

    /// Copy every cached collection into the remote store.
    pub async fn migrate(&self) -> MigrationReport {
        info!("🔄 Migrating local cache to {} store", self.store.store_type());

        let report = MigrationReport {
            team_members: self.migrate_collection::<TeamMember>().await,
            projects: self.migrate_collection::<Project>().await,
            services: self.migrate_collection::<Service>().await,
            contact_submissions: self.migrate_collection::<ContactSubmission>().await,
        };

        if report.total_failed() == 0 {
            info!("✅ Migration finished, {} record(s) copied", report.total_success());
        } else {
            warn!(
                "⚠️  Migration finished with {} failure(s), {} record(s) copied",
                report.total_failed(),
                report.total_success()
            );
        }
        report
    }

    async fn migrate_collection<E: Entity>(&self) -> MigrationCount {
        let items = LocalCache::<E>::new(Arc::clone(&self.kv)).snapshot().await;
        let mut count = MigrationCount {
            total: items.len(),
            ..MigrationCount::default()
        };
        if items.is_empty() {
            debug!("No {} to migrate", E::COLLECTION);
            return count;
        }

        let remote = RemoteCollection::<E>::new(Arc::clone(&self.store));
        for (index, entry) in items.entries().enumerate() {
            let item = match entry {
                Ok(item) => item,
                Err(e) => {
                    warn!("⚠️  Cannot migrate malformed {} entry #{index}: {e}", E::COLLECTION);
                    count.failed += 1;
                    continue;
                }
            };
            match self.copy_item(&remote, &item).await {
                Ok(ItemResult::Inserted) => count.success += 1,
                Ok(ItemResult::AlreadyPresent) => count.skipped += 1,
                Err(e) => {
                    warn!("⚠️  Failed to migrate {} {}: {e}", E::COLLECTION, item.id);
                    count.failed += 1;
                }
            }
        }

        info!(
            "Migrated {}: {}/{} copied, {} skipped, {} failed",
            E::COLLECTION,
            count.success,
            count.total,
            count.skipped,
            count.failed
        );
        count
    }

    /// The local id is never sent: the store mints its own and stamps the
    /// write time.
    async fn copy_item<E: Entity>(
        &self,
        remote: &RemoteCollection<E>,
        item: &Record<E>,
    ) -> Result<ItemResult, RemoteError> {
        if let Some(key) = item.data.natural_key() {
            let existing = self
                .store
                .find_by_field(E::COLLECTION.name(), key.field, &key.value)
                .await?;
            if !existing.is_empty() {
                debug!("{} '{}' already exists remotely, skipping", E::COLLECTION, key.value);
                return Ok(ItemResult::AlreadyPresent);
            }
        }

        remote.insert(&item.data).await?;
        Ok(ItemResult::Inserted)
    }
}
