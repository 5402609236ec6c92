use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Collection, Entity, NaturalKey};

/// Message left through the public contact form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
    pub date: DateTime<Utc>,
    /// Unread flag; only ever goes from `true` to `false`
    #[serde(default = "default_is_new")]
    pub is_new: bool,
}

fn default_is_new() -> bool {
    true
}

impl ContactSubmission {
    /// New unread submission dated now.
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            date: Utc::now(),
            is_new: true,
        }
    }
}

impl Entity for ContactSubmission {
    const COLLECTION: Collection = Collection::ContactSubmissions;

    fn natural_key(&self) -> Option<NaturalKey> {
        NaturalKey::first_of(&[("name", Some(self.name.as_str())), ("email", Some(self.email.as_str()))])
    }
}
