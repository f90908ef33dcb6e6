//! Compiled XPath location paths.
//!
//! Field rules address metadata with XPath 1.0 location paths. Only the part
//! of the language those rules need is supported, and expressions are
//! compiled once so that a malformed rule is reported when it is registered
//! rather than once per record.
//!
//! Supported syntax:
//!
//! - absolute (`/a`, `//a`) and relative (`a/b`) paths, `//` between steps
//! - name tests `name`, `prefix:name`, `prefix:*`, `*`
//! - node tests `text()` and `node()`, abbreviated steps `.` and `..`
//! - attribute steps `@name`, `@prefix:name`, `@*` (last step only)
//! - predicates `[n]`, `[name()='q:n']`, `[local-name()='n']`, `[@a='v']`
//!
//! Unprefixed names match elements in no namespace, as in XPath 1.0.
//!
//! `name()` compares against the prefix recovered from the in-scope
//! declarations, not the one written in the document. If a namespace URI is
//! bound to more than one prefix, use `local-name()` instead.

mod eval;
mod parser;

use std::collections::HashMap;

use roxmltree::Node;

use crate::error::Result;

/// Namespace URI bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    Attribute,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name {
        namespace: Option<String>,
        local: String,
    },
    AnyInNamespace(String),
    Any,
    Text,
    AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Predicate {
    Position(usize),
    NameEquals(String),
    LocalNameEquals(String),
    AttributeEquals {
        namespace: Option<String>,
        local: String,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Predicate>,
}

/// A compiled location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    source: String,
    absolute: bool,
    steps: Vec<Step>,
}

impl XPath {
    /// Compile an expression, resolving prefixes against `namespaces`.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashMap;
    /// use oaipmh_harvester::xpath::XPath;
    ///
    /// let ns = HashMap::from([("dc".to_string(), "http://purl.org/dc/elements/1.1/".to_string())]);
    /// assert!(XPath::compile("dc:title/text()", &ns).is_ok());
    /// assert!(XPath::compile("dc:title/[", &ns).is_err());
    /// assert!(XPath::compile("dcterms:title", &ns).is_err());
    /// ```
    pub fn compile(expression: &str, namespaces: &HashMap<String, String>) -> Result<Self> {
        parser::parse(expression, namespaces)
    }

    /// Evaluate against a context node, returning the string value of every
    /// selected node in document order.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashMap;
    /// use oaipmh_harvester::xpath::XPath;
    ///
    /// let doc = roxmltree::Document::parse("<r><k>a</k><k>b</k></r>").unwrap();
    /// let path = XPath::compile("k/text()", &HashMap::new()).unwrap();
    /// assert_eq!(path.evaluate(doc.root_element()), vec!["a", "b"]);
    /// ```
    #[must_use]
    pub fn evaluate(&self, context: Node<'_, '_>) -> Vec<String> {
        eval::evaluate(self, context)
    }

    /// The expression this path was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
