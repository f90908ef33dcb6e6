//! Catalog name and tag sanitization.
//!
//! The catalog only accepts a restricted alphabet for package names, group
//! names and tags. [`CkanNames`] reproduces CKAN's munging rules; another
//! catalog can plug in its own [`NameSanitizer`].

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::MAX_TAG_LENGTH;

/// Turns free text into catalog-safe identifiers.
pub trait NameSanitizer: Send + Sync {
    /// Sanitize a tag.
    fn munge_tag(&self, tag: &str) -> String;

    /// Derive a package or group name from a title or identifier.
    fn munge_name(&self, title: &str) -> String;
}

pub const MIN_TAG_LENGTH: usize = 2;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;

/// Room left below the maximum so that clashing names can be suffixed.
const NAME_SUFFIX_RESERVE: usize = 5;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ .:/]").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAME_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REPEATED_DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*?[_-]((?:\d{2,4}[-/])?\d{2,4})$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAG_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\- ]").expect("valid regex"));

/// CKAN-compatible sanitizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CkanNames;

impl NameSanitizer for CkanNames {
    /// # Examples
    /// ```
    /// use oaipmh_harvester::names::{CkanNames, NameSanitizer};
    ///
    /// assert_eq!(CkanNames.munge_tag("Sea Ice"), "sea-ice");
    /// assert_eq!(CkanNames.munge_tag("Ærøskøbing (DK)"), "rskbing-dk");
    /// ```
    fn munge_tag(&self, tag: &str) -> String {
        let tag = ascii_equivalents(tag).to_lowercase();
        let tag = TAG_DISALLOWED.replace_all(tag.trim(), "").replace(' ', "-");
        to_length(tag, MIN_TAG_LENGTH, MAX_TAG_LENGTH)
    }

    /// # Examples
    /// ```
    /// use oaipmh_harvester::names::{CkanNames, NameSanitizer};
    ///
    /// assert_eq!(CkanNames.munge_name("oai:example.org:1234"), "oai-example-org-1234");
    /// ```
    fn munge_name(&self, title: &str) -> String {
        let name = ascii_equivalents(title);
        let name = NAME_SEPARATORS.replace_all(&name, "-");
        let name = NAME_DISALLOWED.replace_all(&name, "").to_lowercase();
        let name = REPEATED_DASHES.replace_all(&name, "-");
        let mut name = name.trim_matches('-').to_string();

        let max_length = MAX_NAME_LENGTH - NAME_SUFFIX_RESERVE;
        if name.len() > max_length {
            // Keep a trailing year so truncated names stay recognizable.
            let year = TRAILING_YEAR
                .captures(&name)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            name = match year {
                Some(year) => format!("{}-{year}", &name[..max_length - year.len() - 1]),
                None => name[..max_length].to_string(),
            };
        }

        to_length(name, MIN_NAME_LENGTH, MAX_NAME_LENGTH)
    }
}

/// Decompose accented characters and drop what has no ASCII equivalent.
fn ascii_equivalents(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii)
        .collect()
}

/// Pad with underscores to `min`, cut to `max` (input is ASCII).
fn to_length(mut text: String, min: usize, max: usize) -> String {
    if text.len() < min {
        text.push_str(&"_".repeat(min - text.len()));
    }
    text.truncate(max);
    text
}

/// Truncate to at most `max` characters, respecting char boundaries.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_munge_tag() {
        assert_eq!(CkanNames.munge_tag("  Climate Change "), "climate-change");
        assert_eq!(
            CkanNames.munge_tag("EARTH SCIENCE > OCEANS"),
            "earth-science--oceans"
        );
        assert_eq!(CkanNames.munge_tag("Málaga"), "malaga");
    }

    #[test]
    fn test_munge_tag_pads_short_tags() {
        assert_eq!(CkanNames.munge_tag("x"), "x_");
        assert_eq!(CkanNames.munge_tag("!!"), "__");
    }

    #[test]
    fn test_munge_name() {
        assert_eq!(
            CkanNames.munge_name("oai:thredds.met.no:arcticdata/1"),
            "oai-thredds-met-no-arcticdata-1"
        );
        assert_eq!(CkanNames.munge_name("--Hello  World--"), "hello-world");
        assert_eq!(CkanNames.munge_name("Ocean Physics"), "ocean-physics");
    }

    #[test]
    fn test_munge_name_keeps_trailing_year_when_truncating() {
        let long = format!("{} 2019", "a".repeat(120));
        let name = CkanNames.munge_name(&long);
        assert_eq!(name.len(), MAX_NAME_LENGTH - NAME_SUFFIX_RESERVE);
        assert!(name.ends_with("-2019"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("æøå", 2), "æø");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
