use serde::{Deserialize, Serialize};

use super::{Collection, Entity, NaturalKey};

/// A service offering with its price and feature list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub title: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub delivery_time: String,
}

impl Entity for Service {
    const COLLECTION: Collection = Collection::Services;

    fn natural_key(&self) -> Option<NaturalKey> {
        NaturalKey::first_of(&[("title", Some(self.title.as_str()))])
    }
}
