//! Risk zone classification
//!
//! Total mapping from a verdict onto three ordered risk tiers. The zone is
//! the only signal the policy layer consumes.

use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// Confirmed phishing. Always blocked.
    Red,
    /// Elevated score without a phishing flag. Warned, never blocked.
    Yellow,
    /// Everything else, including "we don't know".
    Green,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Red => write!(f, "red"),
            Zone::Yellow => write!(f, "yellow"),
            Zone::Green => write!(f, "green"),
        }
    }
}

pub struct ZoneClassifier {
    yellow_threshold: f64,
}

impl ZoneClassifier {
    pub fn new(yellow_threshold: f64) -> Self {
        ZoneClassifier { yellow_threshold }
    }

    /// Precedence is fixed: the phishing flag wins over any score, and a
    /// missing score can never raise the zone above green.
    pub fn classify(&self, verdict: &Verdict) -> Zone {
        if verdict.phishing {
            return Zone::Red;
        }
        match verdict.score {
            // Strictly greater: a score sitting exactly on the threshold
            // stays green.
            Some(score) if score > self.yellow_threshold => Zone::Yellow,
            _ => Zone::Green,
        }
    }
}

impl Default for ZoneClassifier {
    fn default() -> Self {
        ZoneClassifier::new(crate::config::DEFAULT_YELLOW_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Confidence;

    fn verdict(score: Option<f64>, phishing: bool) -> Verdict {
        Verdict {
            score,
            phishing,
            confidence: Confidence::Exact,
            explanation: "classifier response".to_string(),
            preview: None,
        }
    }

    #[test]
    fn test_phishing_flag_is_red() {
        let classifier = ZoneClassifier::new(0.3);
        assert_eq!(classifier.classify(&verdict(Some(0.9), true)), Zone::Red);
    }

    #[test]
    fn test_phishing_flag_wins_over_low_score() {
        let classifier = ZoneClassifier::new(0.3);
        // The flag is authoritative even when the score says "harmless".
        assert_eq!(classifier.classify(&verdict(Some(0.0), true)), Zone::Red);
        assert_eq!(classifier.classify(&verdict(None, true)), Zone::Red);
    }

    #[test]
    fn test_high_score_without_flag_is_yellow() {
        let classifier = ZoneClassifier::new(0.3);
        assert_eq!(
            classifier.classify(&verdict(Some(0.31), false)),
            Zone::Yellow
        );
        assert_eq!(
            classifier.classify(&verdict(Some(0.9), false)),
            Zone::Yellow
        );
    }

    #[test]
    fn test_threshold_boundary_is_green() {
        let classifier = ZoneClassifier::new(0.3);
        // Exactly at the threshold: not strictly greater, stays green.
        assert_eq!(classifier.classify(&verdict(Some(0.3), false)), Zone::Green);
    }

    #[test]
    fn test_low_score_is_green() {
        let classifier = ZoneClassifier::new(0.3);
        assert_eq!(
            classifier.classify(&verdict(Some(0.05), false)),
            Zone::Green
        );
    }

    #[test]
    fn test_missing_score_is_green() {
        let classifier = ZoneClassifier::new(0.3);
        assert_eq!(classifier.classify(&verdict(None, false)), Zone::Green);
    }

    #[test]
    fn test_custom_threshold() {
        let classifier = ZoneClassifier::new(0.7);
        assert_eq!(classifier.classify(&verdict(Some(0.5), false)), Zone::Green);
        assert_eq!(
            classifier.classify(&verdict(Some(0.71), false)),
            Zone::Yellow
        );
    }
}
