//! Zone-to-action policy
//!
//! Pure decision layer: maps a classified zone onto block/warn/allow plus
//! the user-facing message. No I/O happens here; the interception engine
//! applies the decision through its surface adapter.

use crate::artifact::Artifact;
use crate::verdict::{Confidence, Verdict};
use crate::zone::Zone;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// Suppress the artifact entirely.
    Block,
    /// Show a caution message, then proceed.
    Warn,
    /// Proceed silently.
    Allow,
}

/// Outcome of one policy evaluation. Owns the artifact so the engine can
/// hand it to the surface adapter without re-threading it separately.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub action: PolicyAction,
    pub zone: Zone,
    pub artifact: Artifact,
    pub message: Option<String>,
}

impl PolicyDecision {
    /// Warn is advisory: the artifact still proceeds after the message.
    pub fn allows_proceed(&self) -> bool {
        matches!(self.action, PolicyAction::Allow | PolicyAction::Warn)
    }
}

pub struct PolicyEnforcer {
    fail_closed: bool,
}

impl PolicyEnforcer {
    pub fn new(fail_closed: bool) -> Self {
        PolicyEnforcer { fail_closed }
    }

    pub fn decide(&self, artifact: Artifact, verdict: &Verdict, zone: Zone) -> PolicyDecision {
        let kind = artifact.kind();
        match zone {
            Zone::Red => PolicyDecision {
                action: PolicyAction::Block,
                zone,
                message: Some(format!(
                    "⚠️ {kind} Red Zone: Phishing detected! {}",
                    block_effect(&artifact)
                )),
                artifact,
            },
            Zone::Yellow => PolicyDecision {
                action: PolicyAction::Warn,
                zone,
                message: Some(format!(
                    "⚠️ {kind} Yellow Zone: Possible phishing. Proceed with caution."
                )),
                artifact,
            },
            Zone::Green => {
                if self.fail_closed && verdict.confidence == Confidence::Unavailable {
                    // Opt-in hardening: without a real verdict, hold the
                    // artifact instead of passing it through. The zone is
                    // still green; only the action changes.
                    PolicyDecision {
                        action: PolicyAction::Block,
                        zone,
                        message: Some(format!(
                            "⚠️ {kind} scan unavailable: scoring service unreachable. {}",
                            block_effect(&artifact)
                        )),
                        artifact,
                    }
                } else {
                    PolicyDecision {
                        action: PolicyAction::Allow,
                        zone,
                        message: None,
                        artifact,
                    }
                }
            }
        }
    }
}

fn block_effect(artifact: &Artifact) -> &'static str {
    match artifact {
        Artifact::Url { .. } | Artifact::Text { .. } => "Navigation blocked.",
        Artifact::Image { .. } | Artifact::File { .. } => "Blocking access.",
    }
}
