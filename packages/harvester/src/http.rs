//! HTTP client wrapper for talking to OAI-PMH repositories.
//!
//! Requests are made exactly once. Retry policy and deadlines belong to
//! whatever schedules the harvest stages.

use reqwest::blocking::Client;

use crate::config::{Credentials, HttpMethod, USER_AGENT};
use crate::error::{HarvesterError, Result};

/// Create a configured HTTP client.
///
/// No request timeout is set.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(None)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Send a request with the given parameters and return the response body.
///
/// With [`HttpMethod::Get`] the parameters go into the query string, with
/// [`HttpMethod::Post`] into a form-encoded body.
pub fn send(
    client: &Client,
    url: &str,
    method: HttpMethod,
    credentials: Option<&Credentials>,
    params: &[(&str, &str)],
) -> Result<String> {
    let request = match method {
        HttpMethod::Get => client.get(url).query(params),
        HttpMethod::Post => client.post(url).form(params),
    };
    let request = match credentials {
        Some(c) => request.basic_auth(&c.username, Some(&c.password)),
        None => request,
    };

    tracing::debug!(url, ?method, ?params, "sending request");
    let response = request.send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvesterError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response.text()?)
}
