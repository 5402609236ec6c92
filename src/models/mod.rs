//! Content model shared by the remote store, the local cache and the repositories.
//!
//! Every collection stores flat records. A record is an entity payload plus an
//! identifier; the payload types in this module never carry the id themselves,
//! which is what allows `add` to accept "a record without id" and the migration
//! tool to strip local ids before inserting remotely.

use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::constants::{KEY_CONTACT_SUBMISSIONS, KEY_PROJECTS, KEY_SERVICES, KEY_TEAM_MEMBERS};

pub mod contact_submission;
pub mod project;
pub mod service;
pub mod team_member;

pub use contact_submission::ContactSubmission;
pub use project::Project;
pub use service::Service;
pub use team_member::TeamMember;

/// The four content collections.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    TeamMembers,
    Projects,
    Services,
    ContactSubmissions,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::TeamMembers,
        Collection::Projects,
        Collection::Services,
        Collection::ContactSubmissions,
    ];

    /// Remote collection name, also used as the local cache key.
    pub fn name(self) -> &'static str {
        match self {
            Collection::TeamMembers => KEY_TEAM_MEMBERS,
            Collection::Projects => KEY_PROJECTS,
            Collection::Services => KEY_SERVICES,
            Collection::ContactSubmissions => KEY_CONTACT_SUBMISSIONS,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Record identifier.
///
/// Remote ids are opaque strings minted by the store. Ids minted by the local
/// fallback are decimal integers, which is how the two id spaces are told apart.
/// Older caches stored integer ids as JSON numbers, so both forms are accepted
/// on input; output is always a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value of a locally minted id.
    pub fn as_local_number(&self) -> Option<u64> {
        if self.is_locally_minted() {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// True when the id looks like one minted by the local fallback.
    pub fn is_locally_minted(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// Next free local id for a cached collection: `max + 1`, or `1` when the
    /// collection holds no integer ids.
    pub fn next_local<'a, I>(existing: I) -> RecordId
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        let max = existing.into_iter().filter_map(RecordId::as_local_number).max().unwrap_or(0);
        RecordId((max + 1).to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordIdVisitor;

        impl Visitor<'_> for RecordIdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or integer record id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RecordId, E> {
                Ok(RecordId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<RecordId, E> {
                // Date.now()-style ids occasionally round-trip through floats
                if v.fract() == 0.0 && v >= 0.0 {
                    Ok(RecordId(format!("{v:.0}")))
                } else {
                    Err(E::custom(format!("non-integer record id {v}")))
                }
            }
        }

        deserializer.deserialize_any(RecordIdVisitor)
    }
}

/// A stored entity: payload plus identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    pub id: RecordId,
    #[serde(flatten)]
    pub data: E,
}

impl<E> Record<E> {
    pub fn new(id: impl Into<RecordId>, data: E) -> Self {
        Self { id: id.into(), data }
    }
}

/// A non-id field used to match records across backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NaturalKey {
    pub field: &'static str,
    pub value: String,
}

impl NaturalKey {
    /// First present, non-empty candidate in `name`, `title`, `email` order.
    pub fn first_of(candidates: &[(&'static str, Option<&str>)]) -> Option<NaturalKey> {
        candidates.iter().find_map(|(field, value)| match value {
            Some(v) if !v.is_empty() => Some(NaturalKey {
                field: *field,
                value: v.to_string(),
            }),
            _ => None,
        })
    }
}

/// Content entity stored in one collection.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection (and cache key) holding this entity type.
    const COLLECTION: Collection;

    /// Natural key used by the migration de-duplication.
    fn natural_key(&self) -> Option<NaturalKey>;
}
