//! Error types for the harvester.
//!
//! A single `HarvesterError` is exposed to library consumers. Every variant
//! belongs to one of four kinds (see [`ErrorKind`]) which decide how far a
//! failure propagates: configuration errors stop a harvest before any I/O,
//! transport errors abort a gather or a single fetch, and extraction or
//! normalization errors only ever fail the unit they occurred in.

use thiserror::Error;

/// Coarse classification of a [`HarvesterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown dialect, malformed rule set. Fatal, raised before any I/O.
    Config,
    /// Network, HTTP or OAI-PMH protocol failure.
    Transport,
    /// Metadata extraction or content serialization failure.
    Extraction,
    /// Failure while turning fetched content into a catalog record.
    Normalization,
}

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// No reader is registered for the requested metadata format.
    #[error("Unknown metadata format: '{0}'")]
    UnknownFormat(String),

    /// A field rule names a kind other than `text` or `textList`.
    #[error("Unknown kind '{kind}' for field '{field}'. Expected 'text' or 'textList'")]
    UnknownFieldKind { field: String, kind: String },

    /// A field rule expression could not be compiled.
    #[error("Invalid expression '{expression}' at offset {position}: {message}")]
    InvalidExpression {
        expression: String,
        position: usize,
        message: String,
    },

    /// An expression uses a namespace prefix that was not declared.
    #[error("Undeclared namespace prefix '{prefix}' in expression '{expression}'")]
    UnknownPrefix { prefix: String, expression: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The repository answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The repository answered with an OAI-PMH `<error>` element.
    #[error("OAI-PMH error '{code}': {message}")]
    OaiError { code: String, message: String },

    /// The response was well-formed XML but not a usable OAI-PMH answer.
    #[error("Malformed OAI-PMH response: {0}")]
    MalformedResponse(String),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// A record carries no `<metadata>` element (e.g. a deleted record).
    #[error("Record {0} has no metadata")]
    MissingMetadata(String),

    /// Unit content could not be serialized or deserialized.
    #[error("Content serialization failed: {0}")]
    ContentSerialization(#[from] serde_json::Error),

    /// Import was requested for a unit that has no fetched content.
    #[error("Unit {0} has no fetched content")]
    MissingContent(String),

    /// A stage was invoked on a unit in the wrong lifecycle state.
    #[error("Unit {guid} cannot be {action} while {status}")]
    InvalidUnitState {
        guid: String,
        status: String,
        action: &'static str,
    },

    /// Fetched content does not have the expected shape.
    #[error("Invalid content for {guid}: {message}")]
    ContentFormat { guid: String, message: String },

    /// The catalog collaborator rejected a call.
    #[error("Catalog {action} failed: {message}")]
    Catalog {
        action: &'static str,
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvesterError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFormat(_)
            | Self::UnknownFieldKind { .. }
            | Self::InvalidExpression { .. }
            | Self::UnknownPrefix { .. } => ErrorKind::Config,
            Self::Http(_)
            | Self::HttpStatus { .. }
            | Self::OaiError { .. }
            | Self::MalformedResponse(_)
            | Self::XmlParse(_)
            | Self::Io(_) => ErrorKind::Transport,
            Self::MissingMetadata(_) | Self::ContentSerialization(_) => ErrorKind::Extraction,
            Self::MissingContent(_)
            | Self::InvalidUnitState { .. }
            | Self::ContentFormat { .. }
            | Self::Catalog { .. } => ErrorKind::Normalization,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarvesterError::UnknownFieldKind {
            field: "title".to_string(),
            kind: "bytes".to_string(),
        };
        assert!(err.to_string().contains("bytes"));
        assert!(err.to_string().contains("textList"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = HarvesterError::InvalidUnitState {
            guid: "oai:example.org:1".to_string(),
            status: "fetch_failed".to_string(),
            action: "imported",
        };
        assert_eq!(
            err.to_string(),
            "Unit oai:example.org:1 cannot be imported while fetch_failed"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            HarvesterError::UnknownFormat("marc".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            HarvesterError::OaiError {
                code: "badVerb".into(),
                message: "nope".into()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            HarvesterError::MissingMetadata("x".into()).kind(),
            ErrorKind::Extraction
        );
        assert_eq!(
            HarvesterError::MissingContent("x".into()).kind(),
            ErrorKind::Normalization
        );
    }
}
