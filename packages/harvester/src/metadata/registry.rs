//! Registry mapping metadata format identifiers to readers.

use std::collections::HashMap;

use super::dialect::{Dialect, DifVariant};
use super::reader::MetadataReader;
use crate::error::{HarvesterError, Result};

struct Entry {
    dialect: Dialect,
    reader: MetadataReader,
}

/// Readers by metadata format identifier.
///
/// Built once at startup and shared by every stage; never mutated while a
/// harvest runs.
#[derive(Default)]
pub struct ReaderRegistry {
    entries: HashMap<String, Entry>,
}

impl ReaderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in dialects: `oai_dc`, `oai_ddi`, and `dif`
    /// read with the given DIF variant.
    ///
    /// # Examples
    /// ```
    /// use oaipmh_harvester::metadata::{Dialect, DifVariant, ReaderRegistry};
    ///
    /// let registry = ReaderRegistry::builtin(DifVariant::Fine).unwrap();
    /// assert!(registry.lookup("oai_dc").is_ok());
    /// assert_eq!(registry.dialect("dif").unwrap(), Dialect::Dif(DifVariant::Fine));
    /// assert!(registry.lookup("marc21").is_err());
    /// ```
    pub fn builtin(dif: DifVariant) -> Result<Self> {
        let mut registry = Self::new();
        for dialect in [Dialect::DublinCore, Dialect::Ddi, Dialect::Dif(dif)] {
            registry.register(dialect.format_id(), dialect, dialect.reader()?);
        }
        Ok(registry)
    }

    /// Register a reader for a format, replacing any previous one.
    pub fn register(&mut self, format_id: impl Into<String>, dialect: Dialect, reader: MetadataReader) {
        self.entries
            .insert(format_id.into(), Entry { dialect, reader });
    }

    /// The reader for a format.
    pub fn lookup(&self, format_id: &str) -> Result<&MetadataReader> {
        self.entry(format_id).map(|e| &e.reader)
    }

    /// The dialect a format is normalized as.
    pub fn dialect(&self, format_id: &str) -> Result<Dialect> {
        self.entry(format_id).map(|e| e.dialect)
    }

    fn entry(&self, format_id: &str) -> Result<&Entry> {
        self.entries
            .get(format_id)
            .ok_or_else(|| HarvesterError::UnknownFormat(format_id.to_string()))
    }
}
