use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use divan_core::Config;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::Result;

/// A single request as handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Ordered; the same key may appear more than once
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_query_param(key, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value for `key`, if any
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status line and undecoded body
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub message: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, message: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP round trip used by every database operation.
///
/// Implementations own connection handling, TLS and timeouts.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

/// Shared `reqwest`-backed transport with default settings
pub fn default_transport() -> Arc<dyn HttpTransport> {
    Arc::new(ReqwestTransport::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_query_params_are_kept_in_order() {
        let mut req = HttpRequest::get("http://localhost:5984/db/_view/app/by_tag");
        req.add_query_param("key", "\"a\"");
        req.add_query_param("key", "\"b\"");

        assert_eq!(
            req.query,
            vec![
                ("key".to_string(), "\"a\"".to_string()),
                ("key".to_string(), "\"b\"".to_string()),
            ]
        );
        assert_eq!(req.query_param("key"), Some("\"a\""));
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "OK", "").is_success());
        assert!(HttpResponse::new(202, "Accepted", "").is_success());
        assert!(!HttpResponse::new(304, "Not Modified", "").is_success());
        assert!(!HttpResponse::new(404, "Not Found", "").is_success());
    }

    #[test]
    fn test_response_json_decoding_error() {
        let resp = HttpResponse::new(200, "OK", "not json");
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, crate::ClientError::Serialization(_)));
    }
}
