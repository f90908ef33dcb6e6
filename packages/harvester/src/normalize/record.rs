//! The normalized package representation handed to the catalog.

use serde::{Deserialize, Serialize};

/// A downloadable or browsable resource attached to a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub resource_type: String,
    pub format: String,
    pub url: String,
}

/// An unmapped field carried along as a key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub key: String,
    pub value: Option<String>,
}

impl Extra {
    #[must_use]
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Scalar package attributes a mapping table may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Title,
    Notes,
    Maintainer,
    MaintainerEmail,
    Url,
}

/// Package record produced by normalization.
///
/// `groups` holds group names straight out of normalization; the import
/// stage replaces them with the catalog ids of the resolved groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,

    #[serde(default)]
    pub formats: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub extras: Vec<Extra>,
}

impl NormalizedRecord {
    /// Empty record with the given identity.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: String) {
        let slot = match attribute {
            Attribute::Title => &mut self.title,
            Attribute::Notes => &mut self.notes,
            Attribute::Maintainer => &mut self.maintainer,
            Attribute::MaintainerEmail => &mut self.maintainer_email,
            Attribute::Url => &mut self.url,
        };
        *slot = Some(value);
    }

    /// Value of an extra, if present.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.as_deref())
    }
}
