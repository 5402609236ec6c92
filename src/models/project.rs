use serde::{Deserialize, Serialize};

use super::{Collection, Entity, NaturalKey};

/// Portfolio project.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    /// Free text; may contain embedded line breaks
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub image: String,
}

impl Entity for Project {
    const COLLECTION: Collection = Collection::Projects;

    fn natural_key(&self) -> Option<NaturalKey> {
        NaturalKey::first_of(&[("title", Some(self.title.as_str()))])
    }
}
