//! Interception engine
//!
//! Owns the full pipeline for one intercepted event: capture the artifact,
//! scan it, normalize the response, classify the zone, decide policy, and
//! apply the decision through the surface adapter. Every event walks an
//! explicit Captured -> Pending -> Resolved state machine so the lifecycle
//! shows up in debug logs.

use crate::artifact::{Artifact, ScanRequest};
use crate::config::Config;
use crate::policy::{PolicyAction, PolicyDecision, PolicyEnforcer};
use crate::scan_client::ScanClient;
use crate::stats::ScanStats;
use crate::verdict::{Verdict, VerdictNormalizer};
use crate::zone::ZoneClassifier;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of one intercepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// Artifact captured, default action suspended.
    Captured,
    /// Scan in flight.
    Pending,
    /// Decision made and applied.
    Resolved(PolicyAction),
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventState::Captured => write!(f, "captured"),
            EventState::Pending => write!(f, "pending"),
            EventState::Resolved(PolicyAction::Block) => write!(f, "resolved(block)"),
            EventState::Resolved(PolicyAction::Warn) => write!(f, "resolved(warn)"),
            EventState::Resolved(PolicyAction::Allow) => write!(f, "resolved(allow)"),
        }
    }
}

struct Event {
    request_id: u64,
    state: EventState,
}

impl Event {
    fn capture(request: &ScanRequest) -> Self {
        log::debug!(
            "event {} captured: {}",
            request.request_id(),
            request.artifact().summary()
        );
        Event {
            request_id: request.request_id(),
            state: EventState::Captured,
        }
    }

    fn advance(&mut self, next: EventState) {
        log::debug!("event {}: {} -> {next}", self.request_id, self.state);
        self.state = next;
    }
}

/// Effect seam between policy and the hosting surface. The engine never
/// renders or navigates itself; it tells the adapter what was decided.
pub trait SurfaceAdapter: Send + Sync {
    /// Show the decision's message to the user (Block and Warn carry one).
    fn present(&self, decision: &PolicyDecision);
    /// Resume the artifact's default action (navigate, render, paste).
    fn proceed(&self, artifact: &Artifact);
    /// Cancel the default action and hide the artifact.
    fn suppress(&self, artifact: &Artifact);
}

/// Default adapter: everything goes to the log. Useful for headless runs
/// and as the demo surface.
pub struct LogSurface;

impl SurfaceAdapter for LogSurface {
    fn present(&self, decision: &PolicyDecision) {
        if let Some(message) = &decision.message {
            match decision.action {
                PolicyAction::Block => log::warn!("{message}"),
                _ => log::info!("{message}"),
            }
        }
    }

    fn proceed(&self, artifact: &Artifact) {
        log::info!("proceeding with {}", artifact.summary());
    }

    fn suppress(&self, artifact: &Artifact) {
        log::warn!("suppressed {}", artifact.summary());
    }
}

pub struct InterceptionEngine {
    scan_client: ScanClient,
    normalizer: VerdictNormalizer,
    classifier: ZoneClassifier,
    enforcer: PolicyEnforcer,
    surface: Arc<dyn SurfaceAdapter>,
    stats: Arc<ScanStats>,
    scan_deadline: Duration,
}

impl InterceptionEngine {
    pub fn new(config: &Config, surface: Arc<dyn SurfaceAdapter>) -> Self {
        let stats = Arc::new(ScanStats::new());
        InterceptionEngine {
            scan_client: ScanClient::new(config, Arc::clone(&stats)),
            normalizer: VerdictNormalizer::new(),
            classifier: ZoneClassifier::new(config.yellow_threshold),
            enforcer: PolicyEnforcer::new(config.fail_closed),
            surface,
            stats,
            scan_deadline: Duration::from_secs(config.scan_timeout_seconds),
        }
    }

    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    /// A clicked link. The adapter has already suspended navigation; the
    /// returned decision says whether it resumes.
    pub async fn handle_link_click(&self, url: impl Into<String>) -> PolicyDecision {
        self.process(Artifact::url(url)).await
    }

    /// An image about to render.
    pub async fn handle_image(
        &self,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
    ) -> PolicyDecision {
        self.process(Artifact::image(bytes, mime_type.into())).await
    }

    /// A file captured before download/open.
    pub async fn handle_file(&self, bytes: Vec<u8>, name: impl Into<String>) -> PolicyDecision {
        self.process(Artifact::file(bytes, name.into())).await
    }

    /// Clipboard text that looks like a link. Scanned as a URL candidate.
    pub async fn handle_clipboard_text(&self, text: impl Into<String>) -> PolicyDecision {
        self.process(Artifact::text(text)).await
    }

    /// Scan and normalize only, skipping policy and surface effects. The
    /// messaging boundary answers with the verdict and leaves presentation
    /// to the remote caller.
    pub async fn assess(&self, artifact: Artifact) -> Verdict {
        let request = ScanRequest::new(artifact, self.scan_deadline);
        log::debug!(
            "assess request {}: {}",
            request.request_id(),
            request.artifact().summary()
        );
        self.stats.record_dispatch();
        self.scan_and_normalize(&request).await
    }

    /// Full pipeline for one artifact. Infallible: the worst the pipeline
    /// produces is a fail-open verdict, never an error.
    pub async fn process(&self, artifact: Artifact) -> PolicyDecision {
        let request = ScanRequest::new(artifact, self.scan_deadline);
        let mut event = Event::capture(&request);

        self.stats.record_dispatch();
        event.advance(EventState::Pending);

        let verdict = self.scan_and_normalize(&request).await;
        let zone = self.classifier.classify(&verdict);
        let decision = self.enforcer.decide(request.into_artifact(), &verdict, zone);
        self.stats.record_decision(decision.action);
        event.advance(EventState::Resolved(decision.action));

        log::info!(
            "event {}: zone={} action={:?} score={:?}",
            event.request_id,
            decision.zone,
            decision.action,
            verdict.score
        );

        self.apply(&decision);
        decision
    }

    async fn scan_and_normalize(&self, request: &ScanRequest) -> Verdict {
        let raw = self.scan_client.scan(request).await;
        let verdict = self.normalizer.normalize(&raw);
        self.stats.record_verdict(verdict.confidence);
        verdict
    }

    fn apply(&self, decision: &PolicyDecision) {
        match decision.action {
            PolicyAction::Block => {
                self.surface.present(decision);
                self.surface.suppress(&decision.artifact);
            }
            PolicyAction::Warn => {
                self.surface.present(decision);
                self.surface.proceed(&decision.artifact);
            }
            PolicyAction::Allow => {
                self.surface.proceed(&decision.artifact);
            }
        }
    }
}
