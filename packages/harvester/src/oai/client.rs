//! Blocking OAI-PMH client.

use std::collections::VecDeque;

use reqwest::blocking::Client;

use super::response::{parse_get_record, parse_identifier_page, parse_identify, Identify};
use crate::config::{Credentials, HttpMethod, SourceConfig};
use crate::error::Result;
use crate::http::{create_client, send};
use crate::types::{Header, Record};

/// Client for one repository.
///
/// The HTTP method and credentials are fixed when the client is created.
pub struct OaiClient {
    client: Client,
    base_url: String,
    method: HttpMethod,
    credentials: Option<Credentials>,
}

impl OaiClient {
    /// Create a client for `base_url` using the method and credentials from
    /// the source configuration.
    pub fn new(base_url: impl Into<String>, config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.into(),
            method: config.method,
            credentials: config.credentials.clone(),
        })
    }

    fn request(&self, params: &[(&str, &str)]) -> Result<String> {
        send(
            &self.client,
            &self.base_url,
            self.method,
            self.credentials.as_ref(),
            params,
        )
    }

    /// `Identify`: describe the repository. Used as a connectivity probe.
    pub fn identify(&self) -> Result<Identify> {
        let body = self.request(&[("verb", "Identify")])?;
        parse_identify(&body)
    }

    /// `ListIdentifiers`: lazily iterate record headers.
    ///
    /// Pages are requested one at a time as the iterator is drained. The
    /// `set` parameter is left out of the request entirely when `set_spec`
    /// is `None`.
    #[must_use]
    pub fn list_identifiers(&self, metadata_prefix: &str, set_spec: Option<&str>) -> ListIdentifiers<'_> {
        ListIdentifiers {
            client: self,
            metadata_prefix: metadata_prefix.to_string(),
            set_spec: set_spec.map(str::to_string),
            buffer: VecDeque::new(),
            resumption_token: None,
            started: false,
            finished: false,
        }
    }

    /// `GetRecord`: fetch one record in the given format.
    pub fn get_record(&self, identifier: &str, metadata_prefix: &str) -> Result<Record> {
        let body = self.request(&[
            ("verb", "GetRecord"),
            ("identifier", identifier),
            ("metadataPrefix", metadata_prefix),
        ])?;
        let header = parse_get_record(&body)?;
        Ok(Record {
            header,
            document: body,
        })
    }
}

/// Lazy `ListIdentifiers` sequence.
///
/// Holds at most one page of headers. After the first error the iterator is
/// exhausted.
pub struct ListIdentifiers<'c> {
    client: &'c OaiClient,
    metadata_prefix: String,
    set_spec: Option<String>,
    buffer: VecDeque<Header>,
    resumption_token: Option<String>,
    started: bool,
    finished: bool,
}

impl ListIdentifiers<'_> {
    fn fetch_page(&mut self) -> Result<()> {
        let body = match (&self.resumption_token, &self.set_spec) {
            (Some(token), _) => self.client.request(&[
                ("verb", "ListIdentifiers"),
                ("resumptionToken", token.as_str()),
            ])?,
            (None, Some(set)) => self.client.request(&[
                ("verb", "ListIdentifiers"),
                ("metadataPrefix", self.metadata_prefix.as_str()),
                ("set", set.as_str()),
            ])?,
            (None, None) => self.client.request(&[
                ("verb", "ListIdentifiers"),
                ("metadataPrefix", self.metadata_prefix.as_str()),
            ])?,
        };
        self.started = true;

        let page = parse_identifier_page(&body)?;
        tracing::debug!(
            headers = page.headers.len(),
            resumption_token = ?page.resumption_token,
            "received identifier page"
        );

        self.resumption_token = page.resumption_token;
        if self.resumption_token.is_none() {
            self.finished = true;
        }
        self.buffer.extend(page.headers);
        Ok(())
    }
}

impl Iterator for ListIdentifiers<'_> {
    type Item = Result<Header>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(header) = self.buffer.pop_front() {
                return Some(Ok(header));
            }
            if self.finished || (self.started && self.resumption_token.is_none()) {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}
