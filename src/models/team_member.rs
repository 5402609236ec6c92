use serde::{Deserialize, Serialize};

use super::{Collection, Entity, NaturalKey};

/// A person shown on the team page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    /// URI or data-URI of the portrait
    #[serde(default)]
    pub image: String,
}

impl TeamMember {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            ..Self::default()
        }
    }
}

impl Entity for TeamMember {
    const COLLECTION: Collection = Collection::TeamMembers;

    fn natural_key(&self) -> Option<NaturalKey> {
        NaturalKey::first_of(&[("name", Some(self.name.as_str())), ("email", Some(self.email.as_str()))])
    }
}
