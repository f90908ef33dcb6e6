//! Schema-driven metadata extraction.
//!
//! A [`MetadataReader`] turns the `<metadata>` element of a record into a
//! [`FieldMapping`](crate::types::FieldMapping) by evaluating a set of named
//! field rules. The [`ReaderRegistry`] maps metadata format identifiers to the
//! reader (and [`Dialect`]) that understands them.

mod dialect;
mod reader;
mod registry;

pub use dialect::{Dialect, DifVariant};
pub use reader::{FieldKind, FieldRule, MetadataReader};
pub use registry::ReaderRegistry;
