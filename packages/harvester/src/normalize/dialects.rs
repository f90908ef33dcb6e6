//! Normalizer implementations for the built-in dialects.

use super::record::{Attribute, Resource};
use super::{available, classify_url, Normalizer};
use crate::config::NOT_AVAILABLE;
use crate::types::FieldMapping;

/// Dublin Core (`oai_dc`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DublinCoreNormalizer;

const DC_MAPPING: &[(Attribute, &str)] = &[
    (Attribute::Title, "title"),
    (Attribute::Notes, "description"),
    (Attribute::Maintainer, "publisher"),
    (Attribute::MaintainerEmail, "maintainer_email"),
    (Attribute::Url, "source"),
];

impl Normalizer for DublinCoreNormalizer {
    fn mapping(&self) -> &[(Attribute, &'static str)] {
        DC_MAPPING
    }

    fn author_of(&self, fields: &FieldMapping) -> Option<String> {
        available(fields, "creator")
    }

    fn license_of(&self, fields: &FieldMapping) -> Option<String> {
        available(fields, "rights")
    }

    fn formats_of(&self, fields: &FieldMapping) -> Vec<String> {
        fields.values("format").to_vec()
    }

    fn resources_of(&self, guid: &str, fields: &FieldMapping) -> Vec<Resource> {
        single_resource(guid, fields, &["identifier"])
    }

    fn tag_fields(&self) -> &[&'static str] {
        &["subject", "type"]
    }
}

/// DDI codebooks (`oai_ddi`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DdiNormalizer;

// DDI has no maintainer e-mail element.
const DDI_MAPPING: &[(Attribute, &str)] = &[
    (Attribute::Title, "title"),
    (Attribute::Notes, "description"),
    (Attribute::Maintainer, "publisher"),
    (Attribute::Url, "source"),
];

impl Normalizer for DdiNormalizer {
    fn mapping(&self) -> &[(Attribute, &'static str)] {
        DDI_MAPPING
    }

    fn author_of(&self, fields: &FieldMapping) -> Option<String> {
        available(fields, "creator")
    }

    fn license_of(&self, fields: &FieldMapping) -> Option<String> {
        available(fields, "rights")
    }

    fn formats_of(&self, fields: &FieldMapping) -> Vec<String> {
        fields.values("format").to_vec()
    }

    fn resources_of(&self, guid: &str, fields: &FieldMapping) -> Vec<Resource> {
        single_resource(guid, fields, &["source", "identifier"])
    }

    fn tag_fields(&self) -> &[&'static str] {
        &["subject", "type"]
    }
}

/// Source field names used by one DIF reader variant.
#[derive(Debug, Clone, Copy)]
struct DifFields {
    mapping: &'static [(Attribute, &'static str)],
    creator: &'static str,
    publisher: &'static str,
    use_constraints: Option<&'static str>,
    access_constraints: &'static str,
    urls: &'static str,
    descriptions: Option<&'static str>,
    title: &'static str,
    tags: &'static [&'static str],
}

const DIF_FINE: DifFields = DifFields {
    mapping: &[
        (Attribute::Title, "Entry-title"),
        (Attribute::Notes, "Summary/Abstract"),
        (Attribute::MaintainerEmail, "Personnel/Email"),
    ],
    creator: "Creator",
    publisher: "Publisher",
    use_constraints: Some("Use-constraints"),
    access_constraints: "Access-constraints",
    urls: "Related_URL/URL",
    descriptions: Some("Related_URL/Description"),
    title: "Entry-title",
    tags: &["Keyword"],
};

const DIF_COARSE: DifFields = DifFields {
    mapping: &[
        (Attribute::Title, "title"),
        (Attribute::Notes, "description"),
        (Attribute::MaintainerEmail, "maintainer_email"),
    ],
    creator: "creator",
    publisher: "publisher",
    use_constraints: None,
    access_constraints: "rights",
    urls: "source",
    descriptions: None,
    title: "title",
    tags: &["subject"],
};

/// Directory Interchange Format (`dif`), for either reader variant.
#[derive(Debug, Clone, Copy)]
pub struct DifNormalizer {
    fields: DifFields,
}

impl DifNormalizer {
    /// Normalizer for records read with per-element field names.
    #[must_use]
    pub fn fine() -> Self {
        Self { fields: DIF_FINE }
    }

    /// Normalizer for records read with Dublin-Core-like field names.
    #[must_use]
    pub fn coarse() -> Self {
        Self { fields: DIF_COARSE }
    }
}

impl Normalizer for DifNormalizer {
    fn mapping(&self) -> &[(Attribute, &'static str)] {
        self.fields.mapping
    }

    /// Creator, else publisher, else the "Not available" sentinel.
    fn author_of(&self, fields: &FieldMapping) -> Option<String> {
        available(fields, self.fields.creator)
            .or_else(|| available(fields, self.fields.publisher))
            .or_else(|| Some(NOT_AVAILABLE.to_string()))
    }

    /// Use and access constraints, combined when both are available.
    fn license_of(&self, fields: &FieldMapping) -> Option<String> {
        let use_constraints = self.fields.use_constraints.and_then(|f| available(fields, f));
        let access_constraints = available(fields, self.fields.access_constraints);
        match (use_constraints, access_constraints) {
            (Some(u), Some(a)) => Some(format!("{u}, {a}")),
            (u, a) => u.or(a),
        }
    }

    fn formats_of(&self, fields: &FieldMapping) -> Vec<String> {
        fields
            .values(self.fields.urls)
            .iter()
            .map(|url| classify_url(url).to_string())
            .collect()
    }

    /// One resource per related URL, paired positionally with its
    /// description and format. Surplus URLs without a description are
    /// dropped.
    fn resources_of(&self, guid: &str, fields: &FieldMapping) -> Vec<Resource> {
        let urls = fields.values(self.fields.urls);
        let formats = self.formats_of(fields);

        let names: Vec<String> = match self.fields.descriptions {
            Some(field) => fields.values(field).to_vec(),
            None => {
                let title = fields.first(self.fields.title).unwrap_or(guid);
                vec![title.to_string(); urls.len()]
            }
        };

        let count = urls.len().min(names.len());
        if count < urls.len() {
            tracing::warn!(
                guid,
                urls = urls.len(),
                descriptions = names.len(),
                dropped = urls.len() - count,
                "related URLs and descriptions differ in length, truncating"
            );
        }

        urls.iter()
            .zip(names)
            .zip(formats)
            .map(|((url, name), format)| Resource {
                name,
                resource_type: format.clone(),
                format,
                url: url.clone(),
            })
            .collect()
    }

    fn tag_fields(&self) -> &[&'static str] {
        self.fields.tags
    }
}

/// The first http(s) URL among the candidate fields, then the guid, as a
/// single resource.
fn single_resource(guid: &str, fields: &FieldMapping, candidates: &[&str]) -> Vec<Resource> {
    let url = candidates
        .iter()
        .flat_map(|field| fields.values(field).iter().map(String::as_str))
        .chain(std::iter::once(guid))
        .map(str::trim)
        .find(|s| s.starts_with("http://") || s.starts_with("https://"));
    let Some(url) = url else {
        return Vec::new();
    };

    let format = match fields.first("format") {
        Some(format) if !format.trim().is_empty() => format.to_string(),
        _ if url.contains("thredds") => "thredds".to_string(),
        _ => "HTML".to_string(),
    };
    let name = fields.first("title").unwrap_or(url).to_string();

    vec![Resource {
        name,
        resource_type: format.clone(),
        format,
        url: url.to_string(),
    }]
}
