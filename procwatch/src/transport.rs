//! Report upload
//!
//! One POST per run: the report goes out as JSON and the body that comes back
//! is decoded into a [`ServerResponse`] for the command interpreter.

use log::info;
use std::time::Duration;

use crate::command::ServerResponse;
use crate::domain::TransportError;
use crate::export::Report;

/// HTTP client bound to the inventory endpoint
#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    url: String,
}

impl Uploader {
    /// # Errors
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("procwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client, url: url.into() })
    }

    /// Send the report and decode the server's answer.
    ///
    /// An empty body means the server has nothing for us and yields `None`.
    ///
    /// # Errors
    /// - [`TransportError::Request`] on connection failure or timeout
    /// - [`TransportError::Status`] on a non-2xx status
    /// - [`TransportError::Decode`] if the body is not a `[bool, payload]` pair
    pub async fn upload(&self, report: &Report) -> Result<Option<ServerResponse>, TransportError> {
        let request_err = |source| TransportError::Request { url: self.url.clone(), source };

        let response =
            self.client.post(&self.url).json(report).send().await.map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(request_err)?;
        info!("Uploaded {} fingers to {} ({} byte response)", report.fingers.len(), self.url, body.len());
        decode_response(&body)
    }
}

/// Decode a response body
///
/// # Errors
/// Returns [`TransportError::Decode`] if the body is not valid JSON or not a
/// `[bool, payload]` pair.
pub fn decode_response(body: &str) -> Result<Option<ServerResponse>, TransportError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(body)?;
    Ok(ServerResponse::from_value(value)?)
}
