//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oaipmh_harvester::xml::get_tag_name;
///
/// let xml = r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "dc");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Get the tag name as written in the document, including its prefix.
///
/// This is what XPath's `name()` returns. The prefix is recovered from the
/// in-scope namespace declarations; a default namespace yields no prefix.
///
/// The document does not keep the prefix an element was written with. When
/// one namespace URI is bound both as the default namespace and to a prefix,
/// the result may carry that prefix even for an unprefixed element. Match on
/// the local name in that case.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oaipmh_harvester::xml::qualified_name;
///
/// let xml = r#"<dif:DIF xmlns:dif="http://gcmd.gsfc.nasa.gov/Aboutus/xml/dif/"><Entry_ID/></dif:DIF>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
/// assert_eq!(qualified_name(root), "dif:DIF");
/// assert_eq!(qualified_name(root.first_element_child().unwrap()), "Entry_ID");
/// ```
pub fn qualified_name(node: Node<'_, '_>) -> String {
    let tag = node.tag_name();
    let prefix = tag
        .namespace()
        .and_then(|ns| node.lookup_prefix(ns))
        .filter(|p| !p.is_empty());
    match prefix {
        Some(prefix) => format!("{prefix}:{}", tag.name()),
        None => tag.name().to_string(),
    }
}

/// Find the first child element with the given local name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oaipmh_harvester::xml::find_child;
///
/// let xml = r#"<root><child1/><child2/></root>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// assert!(find_child(root, "child1").is_some());
/// assert!(find_child(root, "missing").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find all child elements with the given local name.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find a descendant element matching a slash-separated path of local names.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oaipmh_harvester::xml::find_by_path;
///
/// let xml = r#"<record><header><identifier>oai:x:1</identifier></header></record>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let id = find_by_path(doc.root_element(), "header/identifier");
/// assert_eq!(id.unwrap().text(), Some("oai:x:1"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for part in path.split('/') {
        current = find_child(current, part)?;
    }
    Some(current)
}

/// Get the direct text content of a node, trimmed.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Concatenated text of all descendant text nodes, untrimmed.
///
/// This is the XPath string-value of an element.
pub fn string_value(node: Node<'_, '_>) -> String {
    if node.is_text() {
        return node.text().unwrap_or_default().to_string();
    }
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
