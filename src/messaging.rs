//! Message-passing boundary
//!
//! Wire-compatible with the extension message protocol: tagged JSON
//! requests in, `{success, data}` replies out. Scan failures are not
//! protocol failures — an unreachable backend still yields `success: true`
//! with a fail-open verdict. `success: false` is reserved for requests the
//! service cannot even shape into an artifact.

use crate::artifact::Artifact;
use crate::interceptor::InterceptionEngine;
use crate::verdict::Verdict;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScanMessage {
    #[serde(rename = "CHECK_PHISHING_URL")]
    CheckUrl { url: String },
    #[serde(rename = "CHECK_PHISHING_IMAGE")]
    CheckImage {
        /// Base64-encoded image bytes.
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanReply {
    fn ok(verdict: Verdict) -> Self {
        ScanReply {
            success: true,
            data: Some(verdict),
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        ScanReply {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub struct MessageService {
    engine: Arc<InterceptionEngine>,
}

impl MessageService {
    pub fn new(engine: Arc<InterceptionEngine>) -> Self {
        MessageService { engine }
    }

    pub async fn handle(&self, message: ScanMessage) -> ScanReply {
        match message {
            ScanMessage::CheckUrl { url } => {
                if url.trim().is_empty() {
                    return ScanReply::failure("empty url");
                }
                let verdict = self.engine.assess(Artifact::url(url)).await;
                ScanReply::ok(verdict)
            }
            ScanMessage::CheckImage { file, mime_type } => {
                let bytes = match general_purpose::STANDARD.decode(file.as_bytes()) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!("rejecting image message with undecodable payload: {e}");
                        return ScanReply::failure(format!("undecodable image payload: {e}"));
                    }
                };
                if bytes.is_empty() {
                    return ScanReply::failure("empty image payload");
                }
                let mime = mime_type.unwrap_or_else(|| "application/octet-stream".to_string());
                let verdict = self.engine.assess(Artifact::image(bytes, mime)).await;
                ScanReply::ok(verdict)
            }
        }
    }

    /// One line of JSON in, one line of JSON out. Malformed requests get a
    /// failure reply instead of killing the session.
    pub async fn handle_line(&self, line: &str) -> String {
        let reply = match serde_json::from_str::<ScanMessage>(line) {
            Ok(message) => self.handle(message).await,
            Err(e) => ScanReply::failure(format!("unrecognized message: {e}")),
        };
        serde_json::to_string(&reply).unwrap_or_else(|_| {
            r#"{"success":false,"error":"reply serialization failed"}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interceptor::LogSurface;
    use crate::verdict::Confidence;

    fn mock_service() -> MessageService {
        let config = Config {
            use_mock: true,
            ..Config::default()
        };
        let engine = Arc::new(InterceptionEngine::new(&config, Arc::new(LogSurface)));
        MessageService::new(engine)
    }

    #[test]
    fn test_url_message_wire_format() {
        let message = ScanMessage::CheckUrl {
            url: "http://example.com".to_string(),
        };
        let wire = serde_json::to_string(&message).unwrap();

        assert!(wire.contains(r#""type":"CHECK_PHISHING_URL""#));
        assert!(wire.contains(r#""url":"http://example.com""#));
    }

    #[test]
    fn test_image_message_parses_from_extension_shape() {
        let wire = r#"{"type":"CHECK_PHISHING_IMAGE","file":"aGVsbG8=","mime_type":"image/png"}"#;
        let message: ScanMessage = serde_json::from_str(wire).unwrap();

        match message {
            ScanMessage::CheckImage { file, mime_type } => {
                assert_eq!(file, "aGVsbG8=");
                assert_eq!(mime_type.as_deref(), Some("image/png"));
            }
            other => panic!("parsed wrong variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_url_check_returns_verdict() {
        let service = mock_service();
        let reply = service
            .handle(ScanMessage::CheckUrl {
                url: "http://phishing-test.example".to_string(),
            })
            .await;

        assert!(reply.success);
        let verdict = reply.data.unwrap();
        assert!(verdict.phishing);
        assert_eq!(verdict.score, Some(0.95));
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let service = mock_service();
        let reply = service
            .handle(ScanMessage::CheckUrl {
                url: "   ".to_string(),
            })
            .await;

        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("empty url"));
    }

    #[tokio::test]
    async fn test_image_check_decodes_base64() {
        let service = mock_service();
        let encoded = general_purpose::STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0]);
        let reply = service
            .handle(ScanMessage::CheckImage {
                file: encoded,
                mime_type: Some("image/jpeg".to_string()),
            })
            .await;

        assert!(reply.success);
        assert_eq!(reply.data.unwrap().score, Some(0.1));
    }

    #[tokio::test]
    async fn test_undecodable_image_is_rejected() {
        let service = mock_service();
        let reply = service
            .handle(ScanMessage::CheckImage {
                file: "!!not base64!!".to_string(),
                mime_type: None,
            })
            .await;

        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("undecodable"));
    }

    #[tokio::test]
    async fn test_handle_line_round_trip() {
        let service = mock_service();
        let reply = service
            .handle_line(r#"{"type":"CHECK_PHISHING_URL","url":"http://example.com"}"#)
            .await;

        let parsed: ScanReply = serde_json::from_str(&reply).unwrap();
        assert!(parsed.success);
        assert!(!parsed.data.unwrap().phishing);
    }

    #[tokio::test]
    async fn test_handle_line_rejects_garbage() {
        let service = mock_service();
        let reply = service.handle_line("not json at all").await;

        let parsed: ScanReply = serde_json::from_str(&reply).unwrap();
        assert!(!parsed.success);
        assert!(parsed.error.unwrap().contains("unrecognized message"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_still_succeeds_fail_open() {
        // Nothing listens on the discard port; the scan fails fast and the
        // reply carries the fail-open verdict instead of an error.
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            scan_timeout_seconds: 1,
            ..Config::default()
        };
        let engine = Arc::new(InterceptionEngine::new(&config, Arc::new(LogSurface)));
        let service = MessageService::new(engine);

        let reply = service
            .handle(ScanMessage::CheckUrl {
                url: "http://example.com".to_string(),
            })
            .await;

        assert!(reply.success);
        let verdict = reply.data.unwrap();
        assert!(!verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Unavailable);
    }
}
