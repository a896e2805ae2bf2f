//! HTTP client for the remote scoring service
//!
//! One scan per artifact: URLs and clipboard text go to the JSON endpoint,
//! binary payloads go as multipart uploads. All transport failures collapse
//! into `RawResponse::Unavailable` so callers never handle errors, and a
//! mock mode serves deterministic payloads for the demo CLI and tests.

use crate::artifact::{Artifact, ScanRequest};
use crate::config::Config;
use crate::stats::ScanStats;
use crate::verdict::RawResponse;
use anyhow::Result;
use reqwest::multipart;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct ScanClient {
    client: Client,
    backend_url: String,
    proxy_url: Option<String>,
    timeout_seconds: u64,
    use_mock: bool,
    max_attempts: u32,
    backoff_ms: u64,
    stats: Arc<ScanStats>,
}

impl ScanClient {
    pub fn new(config: &Config, stats: Arc<ScanStats>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.scan_timeout_seconds))
            .user_agent("PhishGate/1.0")
            .build()
            .unwrap_or_else(|e| {
                // Requests stay bounded either way: scan() wraps every
                // dispatch in its own deadline.
                log::error!("http client builder failed, using default client: {e}");
                Client::new()
            });

        ScanClient {
            client,
            backend_url: config.backend_url.trim_end_matches('/').to_string(),
            proxy_url: config.proxy_url.clone(),
            timeout_seconds: config.scan_timeout_seconds,
            use_mock: config.use_mock,
            max_attempts: config.retry.max_attempts.max(1),
            backoff_ms: config.retry.backoff_ms,
            stats,
        }
    }

    /// Scan one artifact. Total: transport failures, timeouts, and bad
    /// proxy configuration all come back as `Unavailable`, never as `Err`.
    pub async fn scan(&self, request: &ScanRequest) -> RawResponse {
        if self.use_mock {
            self.stats.record_scan_attempt();
            return self.mock_response(request.artifact());
        }

        let deadline = effective_deadline(request.deadline(), self.timeout_seconds);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            self.stats.record_scan_attempt();
            if attempt > 1 {
                log::debug!(
                    "scan request {} retry {attempt}/{}",
                    request.request_id(),
                    self.max_attempts
                );
                tokio::time::sleep(Duration::from_millis(self.backoff_ms)).await;
            }

            match tokio::time::timeout(deadline, self.dispatch(request.artifact())).await {
                Ok(Ok(body)) => {
                    log::debug!(
                        "scan request {} answered with {} bytes",
                        request.request_id(),
                        body.len()
                    );
                    return RawResponse::Payload(body);
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    log::debug!("scan request {} failed: {last_error}", request.request_id());
                }
                Err(_) => {
                    last_error = format!("scan timed out after {}s", deadline.as_secs());
                    log::debug!("scan request {}: {last_error}", request.request_id());
                }
            }
        }

        RawResponse::Unavailable(last_error)
    }

    async fn dispatch(&self, artifact: &Artifact) -> Result<String> {
        match artifact {
            Artifact::Url { url } => self.scan_url(url).await,
            Artifact::Text { text } => self.scan_url(text).await,
            Artifact::Image { bytes, mime_type } => {
                self.scan_binary(
                    "/scan/image",
                    "image",
                    bytes,
                    "clipboard-image",
                    Some(mime_type.as_str()),
                )
                .await
            }
            Artifact::File { bytes, name } => {
                self.scan_binary("/scan/file", "file", bytes, name, None).await
            }
        }
    }

    async fn scan_url(&self, target: &str) -> Result<String> {
        if let Some(proxy) = &self.proxy_url {
            // The proxy fetches the page itself and answers with whatever
            // it saw; the text may be arbitrary, the normalizer copes.
            let request_url = proxy_scan_url(proxy, target)?;
            let response = self.client.get(request_url).send().await?;
            return Ok(response.text().await?);
        }

        let endpoint = format!("{}/scan/url", self.backend_url);
        let response = self
            .client
            .post(&endpoint)
            .json(&serde_json::json!({ "url": target }))
            .send()
            .await?;
        // Error statuses still carry a body worth keyword-scanning.
        Ok(response.text().await?)
    }

    async fn scan_binary(
        &self,
        path: &str,
        field: &'static str,
        bytes: &[u8],
        file_name: &str,
        mime_type: Option<&str>,
    ) -> Result<String> {
        let mut part = multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        if let Some(mime) = mime_type {
            part = match part.mime_str(mime) {
                Ok(p) => p,
                Err(_) => {
                    log::warn!("unusable mime type {mime:?}, uploading untyped");
                    multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string())
                }
            };
        }

        let form = multipart::Form::new().part(field, part);
        let endpoint = format!("{}{}", self.backend_url, path);
        let response = self.client.post(&endpoint).multipart(form).send().await?;
        Ok(response.text().await?)
    }

    /// Canned payloads keyed off the target, same spirit as a recorded
    /// WHOIS fixture: stable inputs, stable verdicts, no sockets.
    fn mock_response(&self, artifact: &Artifact) -> RawResponse {
        let payload = match artifact {
            Artifact::Url { url } => mock_url_payload(url),
            Artifact::Text { text } => mock_url_payload(text),
            Artifact::Image { .. } | Artifact::File { .. } => {
                r#"{"score":0.1,"phishing":false}"#
            }
        };
        log::debug!("mock scan for {}: {payload}", artifact.summary());
        RawResponse::Payload(payload.to_string())
    }
}

fn mock_url_payload(target: &str) -> &'static str {
    if target.contains("phishing-test") {
        r#"{"score":0.95,"phishing":true,"explanation":"known phishing pattern"}"#
    } else if target.contains("suspicious-test") {
        r#"{"score":0.5,"phishing":false,"explanation":"elevated risk signals"}"#
    } else {
        r#"{"score":0.05,"phishing":false}"#
    }
}

/// Per-request deadline, never looser than the configured client timeout.
fn effective_deadline(requested: Duration, timeout_seconds: u64) -> Duration {
    requested.min(Duration::from_secs(timeout_seconds))
}

fn proxy_scan_url(proxy: &str, target: &str) -> Result<Url> {
    Ok(Url::parse_with_params(proxy, &[("url", target)])?)
}
