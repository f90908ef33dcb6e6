//! OAI-PMH protocol client.
//!
//! Only the verbs the harvest stages need are implemented: `Identify`,
//! `ListIdentifiers` (as a lazy, resumption-token driven iterator) and
//! `GetRecord`.

mod client;
mod response;

pub use client::{ListIdentifiers, OaiClient};
pub use response::{parse_get_record, parse_identify, parse_identifier_page, IdentifierPage, Identify};
