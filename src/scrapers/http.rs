use crate::scrapers::error::{ApiError, TransportError};
use crate::scrapers::traits::Transport;
use crate::scrapers::types::{ApiRequest, HttpMethod};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

fn header_map(request: &ApiRequest) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::Header {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::Header {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        let mut builder = builder.headers(header_map(request)?);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| TransportError::Request {
            url: request.url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|source| TransportError::Request {
            url: request.url.clone(),
            source,
        })?;
        debug!(url = %request.url, bytes = text.len(), "Received response");

        serde_json::from_str(&text).map_err(|e| TransportError::Body {
            url: request.url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Retries every transport failure with a fixed pause between attempts
pub struct RetryingClient<T> {
    transport: T,
    max_attempts: u32,
    delay: Duration,
}

impl<T: Transport> RetryingClient<T> {
    /// `max_attempts` counts the first try; zero is treated as one
    pub fn new(transport: T, max_attempts: u32, delay: Duration) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn call(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let mut attempt = 1;
        loop {
            match self.transport.send(request).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(ApiError::RetriesExhausted {
                        url: request.url.clone(),
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    warn!(
                        url = %request.url,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Request failed, retrying"
                    );
                }
            }
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::StubTransport;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn request() -> ApiRequest {
        ApiRequest::get("https://api.example.test/catalog", &BTreeMap::new())
    }

    fn flaky(failures: usize) -> StubTransport {
        StubTransport::new(move |_req, call| {
            if call < failures {
                Err(TransportError::Status {
                    url: "https://api.example.test/catalog".into(),
                    status: 503,
                })
            } else {
                Ok(json!({"ok": true}))
            }
        })
    }

    #[tokio::test]
    async fn returns_first_success_without_further_attempts() {
        let client = RetryingClient::new(flaky(2), 3, Duration::ZERO);

        let body = client.call(&request()).await.unwrap();

        assert_eq!(body, json!({"ok": true}));
        assert_eq!(client.transport().calls(), 3);
    }

    #[tokio::test]
    async fn success_on_first_attempt_is_not_retried() {
        let client = RetryingClient::new(flaky(0), 5, Duration::ZERO);

        client.call(&request()).await.unwrap();

        assert_eq!(client.transport().calls(), 1);
    }

    #[tokio::test]
    async fn surfaces_last_failure_when_attempts_run_out() {
        let client = RetryingClient::new(flaky(usize::MAX), 3, Duration::ZERO);

        let err = client.call(&request()).await.unwrap_err();

        match err {
            ApiError::RetriesExhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, TransportError::Status { status: 503, .. }));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(client.transport().calls(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_retried_like_server_errors() {
        let transport = StubTransport::new(|_req, call| {
            if call == 0 {
                Err(TransportError::Status {
                    url: "u".into(),
                    status: 404,
                })
            } else {
                Ok(json!([]))
            }
        });
        let client = RetryingClient::new(transport, 2, Duration::ZERO);

        assert_eq!(client.call(&request()).await.unwrap(), json!([]));
        assert_eq!(client.transport().calls(), 2);
    }

    #[tokio::test]
    async fn zero_attempt_budget_still_tries_once() {
        let client = RetryingClient::new(flaky(usize::MAX), 0, Duration::ZERO);

        assert!(client.call(&request()).await.is_err());
        assert_eq!(client.transport().calls(), 1);
    }

    #[test]
    fn invalid_header_names_are_reported() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let request = ApiRequest::get("https://api.example.test", &headers);

        assert!(matches!(
            header_map(&request),
            Err(TransportError::Header { .. })
        ));
    }
}
