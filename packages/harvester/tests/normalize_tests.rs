//! Normalization properties over persisted unit content.

use oaipmh_harvester::metadata::{Dialect, DifVariant};
use oaipmh_harvester::names::CkanNames;
use oaipmh_harvester::normalize::{normalize, NormalizedRecord};
use oaipmh_harvester::types::UnitContent;
use pretty_assertions::assert_eq;
use serde_json::json;

fn content(value: serde_json::Value) -> UnitContent {
    UnitContent::from_json(&value.to_string()).unwrap()
}

fn normalize_dc(value: serde_json::Value) -> NormalizedRecord {
    normalize(Dialect::DublinCore, "oai:example.org:7", &content(value), &CkanNames)
}

fn normalize_dif(value: serde_json::Value) -> NormalizedRecord {
    normalize(
        Dialect::Dif(DifVariant::Fine),
        "oai:example.org:7",
        &content(value),
        &CkanNames,
    )
}

#[test]
fn test_dublin_core_creator_is_author() {
    let record = normalize_dc(json!({"creator": ["Jane Doe"]}));
    assert_eq!(record.author.as_deref(), Some("Jane Doe"));
}

#[test]
fn test_dif_license_ignores_unavailable_use_constraints() {
    let record = normalize_dif(json!({
        "Use-constraints": ["Not available"],
        "Access-constraints": ["CC-BY"]
    }));
    assert_eq!(record.license_id.as_deref(), Some("CC-BY"));
}

#[test]
fn test_invalid_maintainer_email_is_omitted() {
    let record = normalize_dc(json!({"maintainer_email": ["not-an-email"]}));
    assert_eq!(record.maintainer_email, None);

    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("maintainer_email").is_none());
}

#[test]
fn test_dif_formats_follow_url_order() {
    let record = normalize_dif(json!({
        "Related_URL/URL": ["http://x/wms?service=WMS&request=GetCapabilities", "http://x/catalog.html"],
        "Related_URL/Description": ["Map", "Catalog"]
    }));
    assert_eq!(record.formats, vec!["wms", "thredds"]);
    let resource_formats: Vec<&str> = record.resources.iter().map(|r| r.format.as_str()).collect();
    assert_eq!(resource_formats, vec!["wms", "thredds"]);
}

#[test]
fn test_normalization_is_repeatable() {
    let value = json!({
        "set_spec": ["ocean", "ice"],
        "metadata_modified": "2024-01-01T00:00:00+00:00",
        "Entry-title": ["Sea ice"],
        "Creator": ["Not available"],
        "Publisher": ["Met Norway"],
        "Keyword": ["Sea Ice", "Climate; Arctic"],
        "Related_URL/URL": ["http://x/dodsC/ice.nc"],
        "Related_URL/Description": ["OPeNDAP"],
        "Data-set-language": ["en"]
    });
    let first = normalize_dif(value.clone());
    let second = normalize_dif(value);
    assert_eq!(first, second);
    assert_eq!(first.author.as_deref(), Some("Met Norway"));
    assert_eq!(first.tags, vec!["sea-ice", "climate-arctic"]);
    assert_eq!(first.groups, vec!["ocean", "ice"]);
    assert_eq!(first.formats, vec!["opendap"]);
}

#[test]
fn test_absent_fields_never_fail() {
    for dialect in [
        Dialect::DublinCore,
        Dialect::Ddi,
        Dialect::Dif(DifVariant::Coarse),
        Dialect::Dif(DifVariant::Fine),
    ] {
        let record = normalize(dialect, "oai:example.org:7", &content(json!({})), &CkanNames);
        assert_eq!(record.name, "oai-example-org-7");
        assert_eq!(record.title, None);
        assert!(record.tags.is_empty());
        assert!(record.resources.is_empty());
        // set_spec and metadata_modified are always carried
        assert_eq!(record.extras.len(), 2);
    }
}

#[test]
fn test_list_tags_are_not_split() {
    let record = normalize_dc(json!({"subject": ["Sea Ice; Climate"]}));
    assert_eq!(record.tags, vec!["sea-ice-climate"]);
}

#[test]
fn test_flat_string_tags_are_split() {
    let record = normalize_dc(json!({"subject": "Ocean; Sea Ice ;;", "type": ["Dataset"]}));
    assert_eq!(record.tags, vec!["ocean", "sea-ice", "dataset"]);
}

#[test]
fn test_consumed_fields_are_not_extras() {
    let record = normalize_dc(json!({
        "title": ["A"],
        "description": ["B"],
        "publisher": ["C"],
        "source": ["http://example.org/a"],
        "rights": ["CC0"]
    }));
    let keys: Vec<&str> = record.extras.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["metadata_modified", "rights", "set_spec"]);
    assert_eq!(record.url.as_deref(), Some("http://example.org/a"));
}
