//! Parsing of OAI-PMH response envelopes.

use roxmltree::{Document, Node};

use crate::error::{HarvesterError, Result};
use crate::types::Header;
use crate::xml::{find_by_path, find_child, find_children, get_tag_name, get_text};

/// OAI-PMH error code meaning "the list is empty".
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

/// Repository description returned by `Identify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identify {
    pub repository_name: String,
    pub base_url: String,
    pub protocol_version: String,
    pub earliest_datestamp: Option<String>,
    pub granularity: Option<String>,
    pub admin_emails: Vec<String>,
}

/// One page of a `ListIdentifiers` answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierPage {
    pub headers: Vec<Header>,

    /// Token for the next page; `None` on the last page.
    pub resumption_token: Option<String>,
}

/// Check the envelope and surface an OAI-PMH `<error>` as an error.
fn envelope<'a, 'input>(doc: &'a Document<'input>) -> Result<Node<'a, 'input>> {
    let root = doc.root_element();
    if get_tag_name(root) != "OAI-PMH" {
        return Err(HarvesterError::MalformedResponse(format!(
            "expected <OAI-PMH> root element, found <{}>",
            get_tag_name(root)
        )));
    }
    if let Some(error) = find_child(root, "error") {
        return Err(HarvesterError::OaiError {
            code: error.attribute("code").unwrap_or("unknown").to_string(),
            message: get_text(error),
        });
    }
    Ok(root)
}

fn required<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Result<Node<'a, 'input>> {
    find_by_path(node, path)
        .ok_or_else(|| HarvesterError::MalformedResponse(format!("missing <{path}>")))
}

fn optional_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    find_child(node, tag)
        .map(get_text)
        .filter(|s| !s.is_empty())
}

/// Parse an `Identify` response.
pub fn parse_identify(xml: &str) -> Result<Identify> {
    let doc = Document::parse(xml)?;
    let root = envelope(&doc)?;
    let identify = required(root, "Identify")?;

    Ok(Identify {
        repository_name: optional_text(identify, "repositoryName").unwrap_or_default(),
        base_url: optional_text(identify, "baseURL").unwrap_or_default(),
        protocol_version: optional_text(identify, "protocolVersion").unwrap_or_default(),
        earliest_datestamp: optional_text(identify, "earliestDatestamp"),
        granularity: optional_text(identify, "granularity"),
        admin_emails: find_children(identify, "adminEmail").map(get_text).collect(),
    })
}

/// Parse a record `<header>` element.
pub(crate) fn parse_header(node: Node<'_, '_>) -> Result<Header> {
    let identifier = optional_text(node, "identifier").ok_or_else(|| {
        HarvesterError::MalformedResponse("header without <identifier>".to_string())
    })?;

    let datestamp = match optional_text(node, "datestamp") {
        Some(raw) => {
            let parsed = Header::parse_datestamp(&raw);
            if parsed.is_none() {
                tracing::warn!(identifier = %identifier, datestamp = %raw, "unparseable datestamp");
            }
            parsed
        }
        None => None,
    };

    Ok(Header {
        identifier,
        datestamp,
        set_specs: find_children(node, "setSpec")
            .map(get_text)
            .filter(|s| !s.is_empty())
            .collect(),
        deleted: node.attribute("status") == Some("deleted"),
    })
}

/// Parse one `ListIdentifiers` page.
///
/// A `noRecordsMatch` error is an empty, final page.
pub fn parse_identifier_page(xml: &str) -> Result<IdentifierPage> {
    let doc = Document::parse(xml)?;
    let root = match envelope(&doc) {
        Ok(root) => root,
        Err(HarvesterError::OaiError { code, .. }) if code == NO_RECORDS_MATCH => {
            return Ok(IdentifierPage::default());
        }
        Err(e) => return Err(e),
    };
    let list = required(root, "ListIdentifiers")?;

    let headers = find_children(list, "header")
        .map(parse_header)
        .collect::<Result<Vec<_>>>()?;

    let resumption_token = find_child(list, "resumptionToken")
        .map(get_text)
        .filter(|s| !s.is_empty());

    Ok(IdentifierPage {
        headers,
        resumption_token,
    })
}

/// Parse the header of a `GetRecord` response.
pub fn parse_get_record(xml: &str) -> Result<Header> {
    let doc = Document::parse(xml)?;
    let root = envelope(&doc)?;
    let header = required(root, "GetRecord/record/header")?;
    parse_header(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTIFY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2024-05-01T10:00:00Z</responseDate>
  <request verb="Identify">http://example.org/oai</request>
  <Identify>
    <repositoryName>Example Archive</repositoryName>
    <baseURL>http://example.org/oai</baseURL>
    <protocolVersion>2.0</protocolVersion>
    <adminEmail>admin@example.org</adminEmail>
    <earliestDatestamp>2001-01-01</earliestDatestamp>
    <deletedRecord>persistent</deletedRecord>
    <granularity>YYYY-MM-DD</granularity>
  </Identify>
</OAI-PMH>"#;

    #[test]
    fn test_parse_identify() {
        let identify = parse_identify(IDENTIFY).unwrap();
        assert_eq!(identify.repository_name, "Example Archive");
        assert_eq!(identify.protocol_version, "2.0");
        assert_eq!(identify.earliest_datestamp.as_deref(), Some("2001-01-01"));
        assert_eq!(identify.admin_emails, vec!["admin@example.org"]);
    }

    #[test]
    fn test_oai_error_is_surfaced() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <error code="badVerb">Illegal verb</error></OAI-PMH>"#;
        let err = parse_identify(xml).unwrap_err();
        assert!(
            matches!(err, HarvesterError::OaiError { ref code, ref message } if code == "badVerb" && message == "Illegal verb")
        );
    }

    #[test]
    fn test_not_an_oai_response() {
        let err = parse_identify("<html><body>Gateway</body></html>").unwrap_err();
        assert!(matches!(err, HarvesterError::MalformedResponse(_)));
        let err = parse_identify("not xml at all").unwrap_err();
        assert!(matches!(err, HarvesterError::XmlParse(_)));
    }

    #[test]
    fn test_parse_identifier_page() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><ListIdentifiers>
  <header><identifier>oai:x:1</identifier><datestamp>2024-01-01</datestamp><setSpec>a</setSpec><setSpec>b</setSpec></header>
  <header status="deleted"><identifier>oai:x:2</identifier><datestamp>2024-01-02T03:04:05Z</datestamp></header>
  <header><identifier>oai:x:3</identifier></header>
  <resumptionToken cursor="0" completeListSize="5">page-2</resumptionToken>
</ListIdentifiers></OAI-PMH>"#;
        let page = parse_identifier_page(xml).unwrap();
        assert_eq!(page.headers.len(), 3);
        assert_eq!(page.headers[0].set_specs, vec!["a", "b"]);
        assert!(page.headers[1].deleted);
        assert!(page.headers[1].datestamp.is_some());
        assert!(page.headers[2].datestamp.is_none());
        assert_eq!(page.resumption_token.as_deref(), Some("page-2"));
    }

    #[test]
    fn test_empty_resumption_token_ends_list() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><ListIdentifiers>
  <header><identifier>oai:x:9</identifier></header>
  <resumptionToken completeListSize="9" cursor="8"/>
</ListIdentifiers></OAI-PMH>"#;
        let page = parse_identifier_page(xml).unwrap();
        assert_eq!(page.headers.len(), 1);
        assert_eq!(page.resumption_token, None);
    }

    #[test]
    fn test_no_records_match_is_empty_page() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <error code="noRecordsMatch">No records</error></OAI-PMH>"#;
        assert_eq!(parse_identifier_page(xml).unwrap(), IdentifierPage::default());
    }

    #[test]
    fn test_header_without_identifier_is_malformed() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"><GetRecord><record>
  <header><datestamp>2024-01-01</datestamp></header></record></GetRecord></OAI-PMH>"#;
        assert!(matches!(
            parse_get_record(xml).unwrap_err(),
            HarvesterError::MalformedResponse(_)
        ));
    }
}
