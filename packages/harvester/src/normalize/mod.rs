//! Dialect-aware normalization of extracted fields into catalog records.
//!
//! Each [`Dialect`] has one [`Normalizer`] implementation. The shared
//! control flow in [`normalize`] never looks at the dialect itself: it asks
//! the normalizer for its mapping table and derivation rules.
//!
//! Normalization is a pure function of the unit content. Everything that
//! needs the catalog (owner organization, group resolution) happens in the
//! import stage afterwards.

mod dialects;
mod record;

use std::collections::HashSet;

pub use dialects::{DdiNormalizer, DifNormalizer, DublinCoreNormalizer};
pub use record::{Attribute, Extra, NormalizedRecord, Resource};

use crate::config::{MAX_TAG_LENGTH, NOT_AVAILABLE};
use crate::error::Result;
use crate::metadata::{Dialect, DifVariant};
use crate::names::{truncate_chars, NameSanitizer};
use crate::types::{FieldMapping, UnitContent};

/// Field consumed as a group reference besides the set memberships.
pub const SERIES_FIELD: &str = "series";

/// Per-dialect derivation rules.
pub trait Normalizer: Send + Sync {
    /// Target attribute to source field. Only the first value is used.
    fn mapping(&self) -> &[(Attribute, &'static str)];

    fn author_of(&self, fields: &FieldMapping) -> Option<String>;

    fn license_of(&self, fields: &FieldMapping) -> Option<String>;

    fn formats_of(&self, fields: &FieldMapping) -> Vec<String>;

    fn resources_of(&self, guid: &str, fields: &FieldMapping) -> Vec<Resource>;

    /// Fields whose values become tags instead of extras.
    fn tag_fields(&self) -> &[&'static str];

    /// Split fields into sanitized tags and extras.
    ///
    /// List values are one tag each; a field persisted as a flat string is
    /// split on `;`. Fields consumed by the mapping table are skipped. `set_spec` and
    /// `metadata_modified` are carried as extras.
    fn tags_and_extras(
        &self,
        content: &UnitContent,
        sanitizer: &dyn NameSanitizer,
    ) -> (Vec<String>, Vec<Extra>) {
        let consumed: HashSet<&str> = self.mapping().iter().map(|(_, field)| *field).collect();
        let tag_fields = self.tag_fields();

        let mut tags: Vec<String> = Vec::new();
        let mut extras = Vec::new();
        for (key, values) in content.fields.iter() {
            if consumed.contains(key) {
                continue;
            }
            if tag_fields.iter().any(|f| *f == key) {
                // Only a flat string is a `;`-separated tag list.
                let split: Vec<&str> = if content.fields.is_flat(key) {
                    values.iter().flat_map(|v| v.split(';')).collect()
                } else {
                    values.iter().map(String::as_str).collect()
                };
                for tag in split {
                    let tag = tag.trim();
                    if tag.is_empty() {
                        continue;
                    }
                    let tag = sanitizer.munge_tag(truncate_chars(tag, MAX_TAG_LENGTH));
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                continue;
            }
            extras.push(Extra::new(key, first_present(values)));
        }

        extras.push(Extra::new("set_spec", first_present(&content.set_spec)));
        extras.push(Extra::new("metadata_modified", content.metadata_modified.clone()));
        extras.sort_by(|a, b| a.key.cmp(&b.key));

        (tags, extras)
    }

    /// Group names: set memberships first, then series.
    fn groups_of(&self, content: &UnitContent) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for name in content
            .set_spec
            .iter()
            .chain(content.fields.values(SERIES_FIELD))
        {
            let name = name.trim();
            if !name.is_empty() && !groups.iter().any(|g| g == name) {
                groups.push(name.to_string());
            }
        }
        groups
    }
}

impl Dialect {
    /// The normalizer for this dialect.
    #[must_use]
    pub fn normalizer(&self) -> Box<dyn Normalizer> {
        match self {
            Self::DublinCore => Box::new(DublinCoreNormalizer),
            Self::Ddi => Box::new(DdiNormalizer),
            Self::Dif(DifVariant::Coarse) => Box::new(DifNormalizer::coarse()),
            Self::Dif(DifVariant::Fine) => Box::new(DifNormalizer::fine()),
        }
    }
}

/// Build the record for one unit.
///
/// `id` and `name` are both derived from the guid, so the same unit always
/// maps to the same package. `groups` holds unresolved group names.
///
/// # Examples
/// ```
/// use oaipmh_harvester::metadata::Dialect;
/// use oaipmh_harvester::names::CkanNames;
/// use oaipmh_harvester::normalize::normalize;
/// use oaipmh_harvester::types::UnitContent;
///
/// let content = UnitContent::from_json(r#"{"creator": ["Jane Doe"], "title": ["Sea ice"]}"#).unwrap();
/// let record = normalize(Dialect::DublinCore, "oai:example.org:1", &content, &CkanNames);
/// assert_eq!(record.name, "oai-example-org-1");
/// assert_eq!(record.author.as_deref(), Some("Jane Doe"));
/// ```
#[must_use]
pub fn normalize(
    dialect: Dialect,
    guid: &str,
    content: &UnitContent,
    sanitizer: &dyn NameSanitizer,
) -> NormalizedRecord {
    let normalizer = dialect.normalizer();
    let fields = &content.fields;

    let name = sanitizer.munge_name(guid);
    let mut record = NormalizedRecord::new(name.clone(), name);

    for &(attribute, field) in normalizer.mapping() {
        let Some(value) = fields.first(field).map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        if attribute == Attribute::MaintainerEmail && !value.contains('@') {
            tracing::debug!(guid, value, "dropping maintainer_email without '@'");
            continue;
        }
        record.set(attribute, value.to_string());
    }

    record.author = normalizer.author_of(fields);
    record.license_id = normalizer.license_of(fields);
    record.formats = normalizer.formats_of(fields);
    record.resources = normalizer.resources_of(guid, fields);

    let (tags, extras) = normalizer.tags_and_extras(content, sanitizer);
    record.tags = tags;
    record.extras = extras;
    record.groups = normalizer.groups_of(content);

    record
}

/// Last step before a record is handed to the catalog.
pub trait PostProcessor: Send + Sync {
    fn post_process(&self, content: &UnitContent, record: NormalizedRecord) -> Result<NormalizedRecord>;
}

/// Leaves records untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPostProcessing;

impl PostProcessor for NoPostProcessing {
    fn post_process(&self, _content: &UnitContent, record: NormalizedRecord) -> Result<NormalizedRecord> {
        Ok(record)
    }
}

impl<F> PostProcessor for F
where
    F: Fn(&UnitContent, NormalizedRecord) -> Result<NormalizedRecord> + Send + Sync,
{
    fn post_process(&self, content: &UnitContent, record: NormalizedRecord) -> Result<NormalizedRecord> {
        self(content, record)
    }
}

/// Whether a value counts as missing: blank or a "not available" sentinel.
#[must_use]
pub fn is_unavailable(value: &str) -> bool {
    value.trim().is_empty()
        || value
            .to_lowercase()
            .contains(&NOT_AVAILABLE.to_lowercase())
}

/// All values of a field joined with `", "`, or `None` when unavailable.
pub(crate) fn available(fields: &FieldMapping, field: &str) -> Option<String> {
    fields.joined(field).filter(|v| !is_unavailable(v))
}

fn first_present(values: &[String]) -> Option<String> {
    values.first().filter(|v| !v.is_empty()).cloned()
}

/// Classify a related URL by substring, in priority order.
///
/// # Examples
/// ```
/// use oaipmh_harvester::normalize::classify_url;
///
/// assert_eq!(classify_url("http://x/wms?service=WMS"), "wms");
/// assert_eq!(classify_url("http://x/dodsC/sst.nc"), "opendap");
/// assert_eq!(classify_url("http://x/catalog.html"), "thredds");
/// assert_eq!(classify_url("http://x/about"), "HTML");
/// ```
#[must_use]
pub fn classify_url(url: &str) -> &'static str {
    let url = url.to_lowercase();
    if url.contains("wms") {
        "wms"
    } else if url.contains("dods") {
        "opendap"
    } else if url.contains("catalog") {
        "thredds"
    } else {
        "HTML"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::CkanNames;

    fn content(json: serde_json::Value) -> UnitContent {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_is_unavailable() {
        assert!(is_unavailable(""));
        assert!(is_unavailable("  "));
        assert!(is_unavailable("Not available"));
        assert!(is_unavailable("NOT AVAILABLE, see docs"));
        assert!(!is_unavailable("CC-BY"));
    }

    #[test]
    fn test_maintainer_email_without_at_is_omitted() {
        let invalid = content(serde_json::json!({"maintainer_email": ["not-an-email"]}));
        let record = normalize(Dialect::DublinCore, "oai:x:1", &invalid, &CkanNames);
        assert_eq!(record.maintainer_email, None);

        let valid = content(serde_json::json!({"maintainer_email": ["data@example.org"]}));
        let record = normalize(Dialect::DublinCore, "oai:x:1", &valid, &CkanNames);
        assert_eq!(record.maintainer_email.as_deref(), Some("data@example.org"));
    }

    #[test]
    fn test_mapping_uses_first_value() {
        let content = content(serde_json::json!({
            "title": ["First", "Second"],
            "description": ["About"],
            "publisher": ["Met Office"],
            "source": ["http://example.org/ds"]
        }));
        let record = normalize(Dialect::DublinCore, "oai:x:1", &content, &CkanNames);
        assert_eq!(record.title.as_deref(), Some("First"));
        assert_eq!(record.notes.as_deref(), Some("About"));
        assert_eq!(record.maintainer.as_deref(), Some("Met Office"));
        assert_eq!(record.url.as_deref(), Some("http://example.org/ds"));
    }

    #[test]
    fn test_tags_and_extras_partition() {
        let content = content(serde_json::json!({
            "set_spec": ["ocean"],
            "metadata_modified": "2024-01-01T00:00:00+00:00",
            "title": ["Sea ice"],
            "subject": ["Sea Ice; Climate", "Arctic"],
            "type": "Dataset; Collection",
            "language": ["en"],
            "coverage": []
        }));
        let (tags, extras) = DublinCoreNormalizer.tags_and_extras(&content, &CkanNames);

        // List elements stay whole; the flat string is split.
        assert_eq!(tags, vec!["sea-ice-climate", "arctic", "dataset", "collection"]);
        let keys: Vec<&str> = extras.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["coverage", "language", "metadata_modified", "set_spec"]);
        assert_eq!(extras[0].value, None);
        assert_eq!(extras[1].value.as_deref(), Some("en"));
        assert_eq!(extras[3].value.as_deref(), Some("ocean"));
    }

    #[test]
    fn test_long_tags_are_truncated() {
        let long = "a".repeat(150);
        let content = content(serde_json::json!({ "subject": [long] }));
        let (tags, _) = DublinCoreNormalizer.tags_and_extras(&content, &CkanNames);
        assert_eq!(tags[0].len(), MAX_TAG_LENGTH);
    }

    #[test]
    fn test_groups_from_sets_and_series() {
        let content = content(serde_json::json!({
            "set_spec": ["ocean", "ice"],
            "series": ["Elections", "ocean"]
        }));
        assert_eq!(
            DdiNormalizer.groups_of(&content),
            vec!["ocean", "ice", "Elections"]
        );
    }

    #[test]
    fn test_post_processor_closure() {
        let processor = |_: &UnitContent, mut record: NormalizedRecord| -> Result<NormalizedRecord> {
            record.title = Some("Changed".to_string());
            Ok(record)
        };
        let record = processor
            .post_process(&UnitContent::from_json("{}").unwrap(), NormalizedRecord::new("a", "a"))
            .unwrap();
        assert_eq!(record.title.as_deref(), Some("Changed"));
    }
}
