use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, USER_AGENT};

use crate::error::{CheckError, NetworkStage};

pub const EXPECTED_CONTENT_TYPE: &str = "application/json";

const BODY_SNIPPET_CHARS: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorRequest {
    pub url: String,
    pub method: HttpMethod,
    /// JSON body, only sent with [`HttpMethod::Post`].
    pub body: Option<String>,
    pub user_agent: String,
}

/// Fetches the raw descriptor document.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &DescriptorRequest) -> Result<String, CheckError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with an optional overall request timeout.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, CheckError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|error| CheckError::network_from(NetworkStage::Request, error))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &DescriptorRequest) -> Result<String, CheckError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, EXPECTED_CONTENT_TYPE)
                .body(request.body.clone().unwrap_or_default()),
        };

        debug!("Fetching version descriptor: {:?} {}", request.method, request.url);
        let response = builder
            .header(ACCEPT, EXPECTED_CONTENT_TYPE)
            .header(USER_AGENT, &request.user_agent)
            .send()
            .await
            .map_err(|error| CheckError::network_from(NetworkStage::Request, error))?;

        let status = response.status();
        if !status.is_success() {
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, BODY_SNIPPET_CHARS))
                .unwrap_or_default();
            return Err(CheckError::network(
                NetworkStage::Status,
                format!("HTTP {status}{body_snippet}"),
            ));
        }

        check_content_type(response.headers())?;

        response
            .text()
            .await
            .map_err(|error| CheckError::network_from(NetworkStage::Body, error))
    }
}

/// A missing content type is accepted; anything present must be JSON.
fn check_content_type(headers: &HeaderMap) -> Result<(), CheckError> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };
    match value.to_str() {
        Ok(content_type) if is_json_content_type(content_type) => Ok(()),
        Ok(content_type) => Err(CheckError::network(
            NetworkStage::ContentType,
            format!("expected {EXPECTED_CONTENT_TYPE}, got {content_type}"),
        )),
        Err(_) => Err(CheckError::network(
            NetworkStage::ContentType,
            format!(
                "expected {EXPECTED_CONTENT_TYPE}, got non-text header {}",
                String::from_utf8_lossy(value.as_bytes())
            ),
        )),
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == EXPECTED_CONTENT_TYPE || essence == "text/json" || essence.ends_with("+json")
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
