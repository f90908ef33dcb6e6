//! Configuration constants and harvest source configuration.
//!
//! A harvest source carries a free-form JSON configuration blob. It is parsed
//! once per job into an immutable [`SourceConfig`] that is then threaded into
//! every stage. Parsing never fails: anything unusable falls back to defaults.

use serde::Deserialize;

/// Metadata format requested when the configuration does not name one.
pub const DEFAULT_METADATA_PREFIX: &str = "dif";

/// Maximum length of a tag before sanitization.
pub const MAX_TAG_LENGTH: usize = 100;

/// Sentinel used by repositories (and by us) for missing values.
pub const NOT_AVAILABLE: &str = "Not available";

/// User agent string identifying this harvester.
pub const USER_AGENT: &str = concat!("oaipmh-harvester/", env!("CARGO_PKG_VERSION"));

/// HTTP method used for OAI-PMH requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

/// Basic-auth credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Parsed configuration of a harvest source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Optional basic-auth credentials.
    pub credentials: Option<Credentials>,

    /// Optional set-spec filter. Never `Some("")`.
    pub set_spec: Option<String>,

    /// Metadata format identifier (e.g. `oai_dc`, `dif`).
    pub metadata_prefix: String,

    /// HTTP method policy.
    pub method: HttpMethod,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            set_spec: None,
            metadata_prefix: DEFAULT_METADATA_PREFIX.to_string(),
            method: HttpMethod::Post,
        }
    }
}

/// Raw shape of the configuration blob. Every key is optional and wrongly
/// typed values are ignored individually.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    username: Option<serde_json::Value>,
    #[serde(default)]
    password: Option<serde_json::Value>,
    #[serde(default)]
    set: Option<serde_json::Value>,
    #[serde(default)]
    metadata_prefix: Option<serde_json::Value>,
    #[serde(default)]
    force_http_get: Option<serde_json::Value>,
}

fn as_string(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    }
}

impl SourceConfig {
    /// Parse a source configuration blob.
    ///
    /// Empty input, malformed JSON and non-object values all yield the
    /// defaults.
    ///
    /// # Examples
    /// ```
    /// use oaipmh_harvester::config::{HttpMethod, SourceConfig};
    ///
    /// let config = SourceConfig::from_json(r#"{"metadata_prefix": "oai_dc", "force_http_get": true}"#);
    /// assert_eq!(config.metadata_prefix, "oai_dc");
    /// assert_eq!(config.method, HttpMethod::Get);
    ///
    /// let fallback = SourceConfig::from_json("{not json");
    /// assert_eq!(fallback, SourceConfig::default());
    /// ```
    #[must_use]
    pub fn from_json(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::default();
        }

        let raw: RawConfig = match serde_json::from_str(blob) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed source configuration");
                return Self::default();
            }
        };

        let credentials = match (as_string(raw.username), as_string(raw.password)) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        let set_spec = as_string(raw.set).filter(|s| !s.is_empty());

        let metadata_prefix = as_string(raw.metadata_prefix)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_PREFIX.to_string());

        let method = match raw.force_http_get {
            Some(serde_json::Value::Bool(true)) => HttpMethod::Get,
            _ => HttpMethod::Post,
        };

        Self {
            credentials,
            set_spec,
            metadata_prefix,
            method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::from_json("");
        assert_eq!(config.metadata_prefix, "dif");
        assert_eq!(config.method, HttpMethod::Post);
        assert!(config.credentials.is_none());
        assert!(config.set_spec.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = SourceConfig::from_json(
            r#"{"username": "harvest", "password": "secret", "set": "physics",
                "metadata_prefix": "oai_ddi", "force_http_get": true}"#,
        );
        assert_eq!(
            config.credentials,
            Some(Credentials {
                username: "harvest".into(),
                password: "secret".into()
            })
        );
        assert_eq!(config.set_spec.as_deref(), Some("physics"));
        assert_eq!(config.metadata_prefix, "oai_ddi");
        assert_eq!(config.method, HttpMethod::Get);
    }

    #[test]
    fn test_username_without_password_has_no_credentials() {
        let config = SourceConfig::from_json(r#"{"username": "harvest"}"#);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_empty_set_is_unset() {
        let config = SourceConfig::from_json(r#"{"set": ""}"#);
        assert!(config.set_spec.is_none());
    }

    #[test]
    fn test_malformed_json_falls_back() {
        assert_eq!(SourceConfig::from_json("{"), SourceConfig::default());
        assert_eq!(SourceConfig::from_json("[1, 2]"), SourceConfig::default());
        assert_eq!(SourceConfig::from_json("null"), SourceConfig::default());
    }

    #[test]
    fn test_wrongly_typed_values_are_ignored() {
        let config = SourceConfig::from_json(r#"{"force_http_get": "yes", "set": 4}"#);
        assert_eq!(config.method, HttpMethod::Post);
        assert!(config.set_spec.is_none());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            username: "u".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
