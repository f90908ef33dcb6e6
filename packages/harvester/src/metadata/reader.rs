//! Field rule compilation and evaluation.

use std::collections::HashMap;
use std::fmt;

use roxmltree::{Document, Node};

use crate::error::{HarvesterError, Result};
use crate::types::{FieldMapping, Record};
use crate::xml::{find_child, get_tag_name};
use crate::xpath::XPath;

/// How the values selected by a rule are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// All selected values concatenated into a single value.
    Text,
    /// Every selected value, in document order.
    TextList,
}

impl FieldKind {
    /// Parse a kind name as used in rule tables.
    pub fn parse(field: &str, kind: &str) -> Result<Self> {
        match kind {
            "text" => Ok(Self::Text),
            "textList" => Ok(Self::TextList),
            other => Err(HarvesterError::UnknownFieldKind {
                field: field.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextList => "textList",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled field rule.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
    pub path: XPath,
}

/// Extracts a [`FieldMapping`] from one metadata element.
///
/// All rules are compiled up front; a reader that was built successfully
/// cannot fail while extracting.
#[derive(Debug, Clone)]
pub struct MetadataReader {
    rules: Vec<FieldRule>,
}

impl MetadataReader {
    /// Compile a reader from `(field, kind, expression)` rules and a
    /// prefix to namespace URI table.
    ///
    /// # Examples
    /// ```
    /// use oaipmh_harvester::metadata::MetadataReader;
    ///
    /// let reader = MetadataReader::new(
    ///     [("title", "textList", "dc:title/text()")],
    ///     [("dc", "http://purl.org/dc/elements/1.1/")],
    /// );
    /// assert!(reader.is_ok());
    ///
    /// let bad = MetadataReader::new([("title", "bytes", "dc:title")], [("dc", "urn:x")]);
    /// assert!(bad.is_err());
    /// ```
    pub fn new<'r, R, N>(rules: R, namespaces: N) -> Result<Self>
    where
        R: IntoIterator<Item = (&'r str, &'r str, &'r str)>,
        N: IntoIterator<Item = (&'r str, &'r str)>,
    {
        let namespaces: HashMap<String, String> = namespaces
            .into_iter()
            .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
            .collect();

        let rules = rules
            .into_iter()
            .map(|(name, kind, expression)| {
                Ok(FieldRule {
                    name: name.to_string(),
                    kind: FieldKind::parse(name, kind)?,
                    path: XPath::compile(expression, &namespaces)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// The compiled rules, in registration order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Evaluate every rule against a metadata element.
    ///
    /// Every rule yields an entry: `textList` rules with no match yield an
    /// empty list, `text` rules always yield exactly one value.
    #[must_use]
    pub fn extract(&self, metadata: Node<'_, '_>) -> FieldMapping {
        self.rules
            .iter()
            .map(|rule| {
                let values = rule.path.evaluate(metadata);
                let values = match rule.kind {
                    FieldKind::TextList => values,
                    FieldKind::Text => vec![values.concat()],
                };
                (rule.name.clone(), values)
            })
            .collect()
    }

    /// Parse a GetRecord response and extract its `<metadata>` element.
    pub fn extract_record(&self, record: &Record) -> Result<FieldMapping> {
        let doc = Document::parse(&record.document)?;
        let metadata = find_metadata(&doc)
            .ok_or_else(|| HarvesterError::MissingMetadata(record.header.identifier.clone()))?;
        Ok(self.extract(metadata))
    }
}

/// Locate `record/metadata` anywhere in a response document.
fn find_metadata<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    doc.descendants()
        .filter(|n| n.is_element() && get_tag_name(*n) == "record")
        .find_map(|record| find_child(record, "metadata"))
}
