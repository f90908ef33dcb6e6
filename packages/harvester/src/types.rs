//! Core data types for the harvester.
//!
//! These types describe what flows between the stages: headers and records
//! coming off the wire, the field mapping produced by extraction, and the
//! harvest job and unit records that carry state from stage to stage.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::SourceConfig;

/// Extracted metadata: field name to the list of values found for it.
///
/// Lookups of absent fields never fail; they return an empty slice. A field
/// persisted as a bare string instead of a list is remembered as flat and
/// written back the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    values: BTreeMap<String, Vec<String>>,
    flat: BTreeSet<String>,
}

/// A persisted field value: normally a list, but a bare string is accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
    Null(()),
}

impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, values) in &self.values {
            match values.as_slice() {
                [value] if self.flat.contains(key) => map.serialize_entry(key, value)?,
                _ => map.serialize_entry(key, values)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
        let mut fields = Self::new();
        for (key, value) in raw {
            match value {
                OneOrMany::One(s) => {
                    fields.flat.insert(key.clone());
                    fields.values.insert(key, vec![s]);
                }
                OneOrMany::Many(list) => {
                    fields.values.insert(key, list);
                }
                OneOrMany::Null(()) => {
                    fields.values.insert(key, Vec::new());
                }
            }
        }
        Ok(fields)
    }
}

impl FieldMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values of a field, replacing any previous values.
    pub fn insert(&mut self, field: impl Into<String>, values: Vec<String>) {
        let field = field.into();
        self.flat.remove(&field);
        self.values.insert(field, values);
    }

    /// Whether the field was persisted as a single flat string.
    #[must_use]
    pub fn is_flat(&self, field: &str) -> bool {
        self.flat.contains(field)
    }

    /// All values of a field; empty when the field is absent.
    #[must_use]
    pub fn values(&self, field: &str) -> &[String] {
        self.values.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// First value of a field, if any.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.values(field).first().map(String::as_str)
    }

    /// All values of a field joined with `", "`; `None` when there are none.
    #[must_use]
    pub fn joined(&self, field: &str) -> Option<String> {
        let values = self.values(field);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
            flat: BTreeSet::new(),
        }
    }
}

/// OAI-PMH record header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Unique record identifier within the repository.
    pub identifier: String,

    /// Parsed datestamp; `None` when absent or in an unknown granularity.
    pub datestamp: Option<DateTime<Utc>>,

    /// Set memberships.
    pub set_specs: Vec<String>,

    /// Whether the header carries `status="deleted"`.
    pub deleted: bool,
}

impl Header {
    /// Parse an OAI-PMH datestamp in day or seconds granularity.
    ///
    /// # Examples
    /// ```
    /// use oaipmh_harvester::types::Header;
    ///
    /// assert!(Header::parse_datestamp("2024-03-01").is_some());
    /// assert!(Header::parse_datestamp("2024-03-01T12:30:00Z").is_some());
    /// assert!(Header::parse_datestamp("yesterday").is_none());
    /// ```
    #[must_use]
    pub fn parse_datestamp(text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// A fetched record: its header plus the full response document the
/// `<metadata>` element lives in.
#[derive(Debug, Clone)]
pub struct Record {
    pub header: Header,
    pub document: String,
}

/// A remote repository to harvest from.
#[derive(Debug, Clone)]
pub struct HarvestSource {
    /// Catalog id of the source.
    pub id: String,

    /// OAI-PMH base URL.
    pub url: String,

    /// Parsed configuration.
    pub config: SourceConfig,
}

impl HarvestSource {
    /// Create a source, parsing its configuration blob.
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>, config: &str) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            config: SourceConfig::from_json(config),
        }
    }
}

/// One harvesting run against a source.
#[derive(Debug, Clone)]
pub struct HarvestJob {
    pub id: String,
    pub source: HarvestSource,
}

/// Lifecycle state of a harvest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Discovered,
    Fetched,
    FetchFailed,
    Imported,
    ImportFailed,
}

impl UnitStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Fetched => "fetched",
            Self::FetchFailed => "fetch_failed",
            Self::Imported => "imported",
            Self::ImportFailed => "import_failed",
        }
    }

    /// Whether the unit holds content that Import may consume.
    #[must_use]
    pub fn is_importable(&self) -> bool {
        matches!(self, Self::Fetched | Self::Imported | Self::ImportFailed)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content stored on a unit by Fetch and consumed by Import.
///
/// Serializes to a flat JSON object: one key per extracted field plus
/// `set_spec` and, when known, `metadata_modified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitContent {
    #[serde(default)]
    pub set_spec: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_modified: Option<String>,

    #[serde(flatten)]
    pub fields: FieldMapping,
}

impl UnitContent {
    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the persisted JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// One discovered record within a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestUnit {
    /// Record identifier, unique within the job.
    pub guid: String,

    /// Owning job.
    pub job_id: String,

    pub status: UnitStatus,

    /// Serialized [`UnitContent`], set by a successful Fetch.
    pub content: Option<String>,

    /// Catalog package written by the last successful Import.
    pub package_id: Option<String>,
}

impl HarvestUnit {
    #[must_use]
    pub fn new(guid: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            job_id: job_id.into(),
            status: UnitStatus::Discovered,
            content: None,
            package_id: None,
        }
    }
}

/// Pipeline stage, used to label recorded errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Gather,
    Fetch,
    Import,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gather => "gather",
            Self::Fetch => "fetch",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mapping_absent_field() {
        let fields = FieldMapping::new();
        assert!(fields.values("title").is_empty());
        assert_eq!(fields.first("title"), None);
        assert_eq!(fields.joined("title"), None);
    }

    #[test]
    fn test_field_mapping_joined() {
        let mut fields = FieldMapping::new();
        fields.insert("creator", vec!["Doe, J.".into(), "Roe, R.".into()]);
        assert_eq!(fields.joined("creator").as_deref(), Some("Doe, J., Roe, R."));
        assert_eq!(fields.first("creator"), Some("Doe, J."));
    }

    #[test]
    fn test_unit_content_json_shape() {
        let mut fields = FieldMapping::new();
        fields.insert("title", vec!["Sea ice".into()]);
        let content = UnitContent {
            set_spec: vec!["ocean".into()],
            metadata_modified: Some("2024-01-02T00:00:00+00:00".into()),
            fields,
        };

        let value: serde_json::Value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["title"], serde_json::json!(["Sea ice"]));
        assert_eq!(value["set_spec"], serde_json::json!(["ocean"]));
        assert_eq!(value["metadata_modified"], "2024-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_unit_content_without_timestamp() {
        let content = UnitContent::from_json(r#"{"set_spec": [], "title": ["A"]}"#).unwrap();
        assert_eq!(content.metadata_modified, None);
        assert_eq!(content.fields.first("title"), Some("A"));
        assert!(!content.to_json().unwrap().contains("metadata_modified"));
    }

    #[test]
    fn test_unit_content_accepts_flat_strings() {
        let content = UnitContent::from_json(r#"{"subject": "a;b", "empty": null}"#).unwrap();
        assert_eq!(content.fields.values("subject"), ["a;b".to_string()]);
        assert!(content.fields.is_flat("subject"));
        assert!(content.fields.values("empty").is_empty());
        assert!(!content.fields.is_flat("empty"));
        assert!(content.set_spec.is_empty());

        // Flat fields survive a round trip through the persisted form.
        let json: serde_json::Value = serde_json::from_str(&content.to_json().unwrap()).unwrap();
        assert_eq!(json["subject"], "a;b");
    }

    #[test]
    fn test_parse_datestamp() {
        let dt = Header::parse_datestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:00+00:00");
        let day = Header::parse_datestamp("2024-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(Header::parse_datestamp("").is_none());
    }

    #[test]
    fn test_unit_status() {
        assert!(!UnitStatus::FetchFailed.is_importable());
        assert!(UnitStatus::ImportFailed.is_importable());
        assert_eq!(UnitStatus::ImportFailed.to_string(), "import_failed");
    }
}
