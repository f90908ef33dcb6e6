//! OAI-PMH Harvester - Harvest metadata records into catalog packages.
//!
//! Records are harvested in three stages. Gather lists the identifiers a
//! repository exposes and creates one harvest unit per record. Fetch
//! retrieves a record and extracts its fields with the reader registered for
//! the metadata format. Import normalizes those fields into a package and
//! writes it to the catalog.
//!
//! # Example
//!
//! ```
//! use oaipmh_harvester::metadata::{DifVariant, ReaderRegistry};
//! use oaipmh_harvester::config::SourceConfig;
//!
//! let config = SourceConfig::from_json(r#"{"metadata_prefix": "oai_dc", "set": "ocean"}"#);
//! assert_eq!(config.set_spec.as_deref(), Some("ocean"));
//!
//! let registry = ReaderRegistry::builtin(DifVariant::Fine).unwrap();
//! assert!(registry.lookup(&config.metadata_prefix).is_ok());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and source configuration parsing
//! - [`types`]: Core data types (FieldMapping, HarvestUnit, etc.)
//! - [`error`]: Error types and Result alias
//! - [`xml`]: XML utilities
//! - [`xpath`]: Compiled XPath subset used by field rules
//! - [`metadata`]: Field extraction rules, dialects and the reader registry
//! - [`http`]: HTTP client
//! - [`oai`]: OAI-PMH protocol client
//! - [`names`]: Tag and package name sanitization
//! - [`normalize`]: Dialect-aware record normalization
//! - [`catalog`]: Catalog collaborator interface
//! - [`store`]: Unit and error persistence
//! - [`harvester`]: The gather, fetch and import stages
//! - [`cli`]: Command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod harvester;
pub mod http;
pub mod metadata;
pub mod names;
pub mod normalize;
pub mod oai;
pub mod store;
pub mod types;
pub mod xml;
pub mod xpath;

// Re-export commonly used items
pub use config::SourceConfig;
pub use error::{ErrorKind, HarvesterError, Result};
pub use harvester::{FetchHooks, Harvester, HarvesterInfo};
pub use normalize::{normalize, NormalizedRecord};
pub use types::{FieldMapping, HarvestJob, HarvestSource, HarvestUnit, UnitContent, UnitStatus};
