pub mod artifact;
pub mod clipboard;
pub mod config;
pub mod interceptor;
pub mod messaging;
pub mod policy;
pub mod scan_client;
pub mod stats;
pub mod verdict;
pub mod zone;

pub use artifact::{Artifact, ScanRequest};
pub use clipboard::{
    ClipboardMonitor, ClipboardSource, CommandClipboard, MonitorHandle, ScriptedClipboard,
};
pub use config::Config;
pub use interceptor::{EventState, InterceptionEngine, LogSurface, SurfaceAdapter};
pub use messaging::{MessageService, ScanMessage, ScanReply};
pub use policy::{PolicyAction, PolicyDecision, PolicyEnforcer};
pub use scan_client::ScanClient;
pub use stats::{ScanStats, StatsSnapshot};
pub use verdict::{Confidence, RawResponse, Verdict, VerdictNormalizer};
pub use zone::{Zone, ZoneClassifier};
