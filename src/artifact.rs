use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// A unit of content subject to risk evaluation. Immutable once captured.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Url { url: String },
    Image { bytes: Vec<u8>, mime_type: String },
    File { bytes: Vec<u8>, name: String },
    Text { text: String },
}

impl Artifact {
    pub fn url(url: impl Into<String>) -> Self {
        Artifact::Url { url: url.into() }
    }

    pub fn image(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Artifact::Image {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn file(bytes: Vec<u8>, name: impl Into<String>) -> Self {
        Artifact::File {
            bytes,
            name: name.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Artifact::Text { text: text.into() }
    }

    /// User-facing label used in policy messages ("URL Red Zone: ...").
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Url { .. } => "URL",
            Artifact::Image { .. } => "Image",
            Artifact::File { .. } => "File",
            Artifact::Text { .. } => "Text",
        }
    }

    /// Short loggable description. Never dumps payload bytes and truncates
    /// long text so clipboard contents don't end up in logs wholesale.
    pub fn summary(&self) -> String {
        match self {
            Artifact::Url { url } => truncate_chars(url, 120),
            Artifact::Image { bytes, mime_type } => {
                format!("{} ({} bytes)", mime_type, bytes.len())
            }
            Artifact::File { bytes, name } => {
                format!("{} ({} bytes)", truncate_chars(name, 80), bytes.len())
            }
            Artifact::Text { text } => truncate_chars(text, 80),
        }
    }
}

/// An artifact on its way to the scoring service. Created by the
/// interception layer at capture time, consumed by the scan client,
/// never persisted.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    artifact: Artifact,
    request_id: u64,
    deadline: Duration,
}

impl ScanRequest {
    pub fn new(artifact: Artifact, deadline: Duration) -> Self {
        ScanRequest {
            artifact,
            request_id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            deadline,
        }
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Correlation id for log lines; ids are process-unique, nothing more.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn into_artifact(self) -> Artifact {
        self.artifact
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
