//! Verdict normalization
//!
//! Converts whatever the scoring service sends back (well-formed JSON,
//! arbitrary text, or nothing at all) into one canonical `Verdict`. This is
//! the only place that touches raw service output, and it never fails: the
//! "unavailable" and "heuristic" paths are its error channel.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of characters carried in a verdict preview.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Opaque payload returned by the remote service. Owned transiently by the
/// scan client; `Unavailable` carries the transport error text for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Payload(String),
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The service answered with parseable JSON.
    Exact,
    /// The service answered with text we could only keyword-scan.
    Heuristic,
    /// The service never answered (network failure or deadline).
    Unavailable,
}

/// Canonical classification result. Never mutated after creation.
///
/// Invariant: `phishing == true` means the artifact must never be
/// auto-opened, regardless of score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub phishing: bool,
    pub confidence: Confidence,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Response schema the scoring service is supposed to honor. Extra fields
/// are ignored; anything that doesn't fit this shape goes through the
/// keyword fallback instead.
#[derive(Debug, Deserialize)]
struct ScanResponseBody {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    phishing: Option<bool>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    preview: Option<String>,
}

pub struct VerdictNormalizer {
    keyword: Regex,
}

impl VerdictNormalizer {
    pub fn new() -> Self {
        // Fixed, known-good pattern; compiled once and reused per response.
        let keyword = Regex::new(r"(?i)(malware|phishing)").unwrap();
        VerdictNormalizer { keyword }
    }

    /// Build a canonical verdict from a raw scan response. Total: every
    /// input produces a verdict, including garbage and absent responses.
    pub fn normalize(&self, raw: &RawResponse) -> Verdict {
        match raw {
            RawResponse::Unavailable(reason) => {
                log::warn!("scan service unreachable: {reason}");
                // Fail-open: an unreachable scorer must not break the
                // surface. The policy layer decides what to do with it.
                Verdict {
                    score: None,
                    phishing: false,
                    confidence: Confidence::Unavailable,
                    explanation: "service unreachable".to_string(),
                    preview: None,
                }
            }
            RawResponse::Payload(text) => match serde_json::from_str::<ScanResponseBody>(text) {
                Ok(body) => {
                    log::debug!(
                        "scan response parsed: score={:?} phishing={:?}",
                        body.score,
                        body.phishing
                    );
                    Verdict {
                        score: body.score,
                        phishing: body.phishing.unwrap_or(false),
                        confidence: Confidence::Exact,
                        explanation: body
                            .explanation
                            .unwrap_or_else(|| "classifier response".to_string()),
                        preview: body.preview.map(|p| truncate_preview(&p)),
                    }
                }
                Err(e) => {
                    log::debug!("scan response is not schema JSON ({e}), applying text heuristic");
                    self.heuristic_verdict(text)
                }
            },
        }
    }

    /// Keyword fallback for non-JSON payloads (error pages, plain-text
    /// diagnostics). A usable signal beats failing closed or crashing.
    fn heuristic_verdict(&self, text: &str) -> Verdict {
        let phishing = self.keyword.is_match(text);
        if phishing {
            log::info!("heuristic fallback flagged response text as phishing");
        }
        Verdict {
            score: None,
            phishing,
            confidence: Confidence::Heuristic,
            explanation: "fallback text heuristic".to_string(),
            preview: Some(truncate_preview(text)),
        }
    }
}

impl Default for VerdictNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// First `PREVIEW_MAX_CHARS` characters of `text`, cut on a char boundary.
/// Truncation only; the text is not re-encoded or escaped.
fn truncate_preview(text: &str) -> String {
    let cut = text
        .char_indices()
        .nth(PREVIEW_MAX_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_fail_open() {
        let normalizer = VerdictNormalizer::new();
        let verdict =
            normalizer.normalize(&RawResponse::Unavailable("connection refused".to_string()));

        assert_eq!(verdict.score, None);
        assert!(!verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Unavailable);
        assert_eq!(verdict.explanation, "service unreachable");
        assert_eq!(verdict.preview, None);
    }

    #[test]
    fn test_valid_json_passes_through() {
        let normalizer = VerdictNormalizer::new();
        let raw = RawResponse::Payload(r#"{"score": 0.9, "phishing": true}"#.to_string());
        let verdict = normalizer.normalize(&raw);

        assert_eq!(verdict.score, Some(0.9));
        assert!(verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Exact);
    }

    #[test]
    fn test_missing_fields_default() {
        let normalizer = VerdictNormalizer::new();
        let verdict = normalizer.normalize(&RawResponse::Payload("{}".to_string()));

        assert_eq!(verdict.score, None);
        assert!(!verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Exact);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let normalizer = VerdictNormalizer::new();
        let raw = RawResponse::Payload(
            r#"{"score": 0.2, "phishing": false, "model": "v7", "latency_ms": 41}"#.to_string(),
        );
        let verdict = normalizer.normalize(&raw);

        assert_eq!(verdict.score, Some(0.2));
        assert!(!verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Exact);
    }

    #[test]
    fn test_heuristic_detects_phishing_keyword() {
        let normalizer = VerdictNormalizer::new();
        let raw = RawResponse::Payload("Warning: PHISHING site reported".to_string());
        let verdict = normalizer.normalize(&raw);

        assert!(verdict.phishing);
        assert_eq!(verdict.score, None);
        assert_eq!(verdict.confidence, Confidence::Heuristic);
        assert_eq!(verdict.explanation, "fallback text heuristic");
    }

    #[test]
    fn test_heuristic_detects_malware_keyword() {
        let normalizer = VerdictNormalizer::new();
        let raw = RawResponse::Payload(
            "Internal Server Error: possible malware detected".to_string(),
        );
        let verdict = normalizer.normalize(&raw);

        assert!(verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_heuristic_clean_text_stays_clean() {
        let normalizer = VerdictNormalizer::new();
        let raw = RawResponse::Payload("503 Service Temporarily Unavailable".to_string());
        let verdict = normalizer.normalize(&raw);

        assert!(!verdict.phishing);
        assert_eq!(verdict.confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_preview_is_first_200_chars() {
        let normalizer = VerdictNormalizer::new();
        let text = "x".repeat(500);
        let verdict = normalizer.normalize(&RawResponse::Payload(text));

        let preview = verdict.preview.unwrap();
        assert_eq!(preview.chars().count(), 200);
        assert_eq!(preview, "x".repeat(200));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let normalizer = VerdictNormalizer::new();
        // Multibyte characters: byte-indexed slicing would panic here.
        let text = "こんにちは".repeat(100);
        let verdict = normalizer.normalize(&RawResponse::Payload(text));

        let preview = verdict.preview.unwrap();
        assert_eq!(preview.chars().count(), 200);
    }

    #[test]
    fn test_short_payload_preview_not_padded() {
        let normalizer = VerdictNormalizer::new();
        let verdict = normalizer.normalize(&RawResponse::Payload("oops".to_string()));
        assert_eq!(verdict.preview.as_deref(), Some("oops"));
    }

    #[test]
    fn test_wrong_typed_score_falls_back_to_heuristic() {
        let normalizer = VerdictNormalizer::new();
        let raw = RawResponse::Payload(r#"{"score": "high", "phishing": false}"#.to_string());
        let verdict = normalizer.normalize(&raw);

        // Schema violation: the whole payload is treated as text. The word
        // "phishing" appears in it, so the keyword scan trips.
        assert_eq!(verdict.confidence, Confidence::Heuristic);
        assert!(verdict.phishing);
    }

    #[test]
    fn test_exact_preview_also_truncated() {
        let normalizer = VerdictNormalizer::new();
        let long_preview = "p".repeat(400);
        let raw = RawResponse::Payload(format!(
            r#"{{"score": 0.1, "phishing": false, "preview": "{long_preview}"}}"#
        ));
        let verdict = normalizer.normalize(&raw);

        assert_eq!(verdict.preview.unwrap().chars().count(), 200);
    }
}
