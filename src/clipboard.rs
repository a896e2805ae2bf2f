//! Clipboard monitoring
//!
//! A single sequential poll loop watches the system clipboard and feeds
//! link-looking text into the interception engine. The clipboard itself is
//! read through the `ClipboardSource` trait so tests and demos can script
//! it; the real source shells out to whichever clipboard tool the host has,
//! with a hard deadline on each read so a stuck paste tool cannot stall the
//! loop.

use crate::interceptor::InterceptionEngine;
use crate::stats::ScanStats;
use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Future returned by one clipboard read.
pub type ClipboardRead<'a> = Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;

/// Where clipboard text comes from. `Ok(None)` means "nothing usable this
/// tick" (empty clipboard, non-text content); errors mean the read itself
/// failed and the tick is skipped. Reads must be bounded: a source that can
/// hang has to enforce its own deadline.
pub trait ClipboardSource: Send {
    fn read_text(&mut self) -> ClipboardRead<'_>;
}

const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-paste", &["--no-newline"]),
    ("xclip", &["-selection", "clipboard", "-o"]),
    ("pbpaste", &[]),
];

/// Paste tools can hang when the selection owner is unresponsive; a read
/// that outlives this deadline is killed and counted as a failed tick.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Reads the clipboard by shelling out to the first paste tool found on
/// PATH (`wl-paste`, `xclip`, `pbpaste`).
pub struct CommandClipboard {
    program: &'static str,
    args: &'static [&'static str],
    read_timeout: Duration,
}

impl CommandClipboard {
    pub fn detect() -> Option<Self> {
        for &(program, args) in CLIPBOARD_TOOLS {
            if tool_available(program) {
                log::debug!("using clipboard tool: {program}");
                return Some(CommandClipboard {
                    program,
                    args,
                    read_timeout: READ_TIMEOUT,
                });
            }
        }
        log::warn!("no clipboard tool found (tried wl-paste, xclip, pbpaste)");
        None
    }
}

impl ClipboardSource for CommandClipboard {
    fn read_text(&mut self) -> ClipboardRead<'_> {
        Box::pin(async move {
            let mut command = tokio::process::Command::new(self.program);
            // kill_on_drop reaps the child if the deadline fires first.
            command.args(self.args).kill_on_drop(true);

            let output = match tokio::time::timeout(self.read_timeout, command.output()).await {
                Ok(result) => result.map_err(|e| anyhow!("failed to run {}: {e}", self.program))?,
                Err(_) => {
                    return Err(anyhow!(
                        "{} did not answer within {:?}",
                        self.program,
                        self.read_timeout
                    ));
                }
            };

            if !output.status.success() {
                // Paste tools exit nonzero on an empty clipboard.
                return Ok(None);
            }

            let text = String::from_utf8_lossy(&output.stdout)
                .trim_end_matches('\n')
                .to_string();
            if text.is_empty() {
                Ok(None)
            } else {
                Ok(Some(text))
            }
        })
    }
}

fn tool_available(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Deterministic source for demos and tests: yields its entries in order,
/// then reads as empty forever.
pub struct ScriptedClipboard {
    values: VecDeque<String>,
}

impl ScriptedClipboard {
    pub fn new(values: Vec<&str>) -> Self {
        ScriptedClipboard {
            values: values.into_iter().map(str::to_string).collect(),
        }
    }
}

impl ClipboardSource for ScriptedClipboard {
    fn read_text(&mut self) -> ClipboardRead<'_> {
        let value = self.values.pop_front().filter(|v| !v.is_empty());
        Box::pin(async move { Ok(value) })
    }
}

pub struct ClipboardMonitor {
    engine: Arc<InterceptionEngine>,
    source: Box<dyn ClipboardSource>,
    last_seen: Option<String>,
    stats: Arc<ScanStats>,
}

impl ClipboardMonitor {
    pub fn new(engine: Arc<InterceptionEngine>, source: Box<dyn ClipboardSource>) -> Self {
        let stats = engine.stats();
        ClipboardMonitor {
            engine,
            source,
            last_seen: None,
            stats,
        }
    }

    /// One poll tick. Returns true when a scan was dispatched. Ticks are
    /// sequential by construction; only the scans themselves run
    /// concurrently.
    pub async fn poll_once(&mut self) -> bool {
        self.stats.record_clipboard_tick();

        let text = match self.source.read_text().await {
            Ok(Some(text)) => text,
            Ok(None) => return false,
            Err(e) => {
                // A broken clipboard read never stops the loop.
                log::warn!("clipboard read failed: {e}");
                return false;
            }
        };

        if self.last_seen.as_deref() == Some(text.as_str()) {
            self.stats.record_clipboard_duplicate();
            return false;
        }
        // Remember the value before dispatching: a repeat on the next tick
        // must dedup even while the scan is still in flight.
        self.last_seen = Some(text.clone());

        if !text.starts_with("http") {
            log::debug!("clipboard changed but is not a link, skipping scan");
            return false;
        }

        log::debug!("clipboard link detected, dispatching scan");
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            engine.handle_clipboard_text(text).await;
        });
        true
    }

    /// Start the poll loop as an owned task.
    pub fn spawn(mut self, poll_interval: Duration) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            log::info!(
                "clipboard monitor started (poll interval {}s)",
                poll_interval.as_secs_f64()
            );
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.poll_once().await;
                    }
                    _ = &mut shutdown_rx => {
                        log::info!("clipboard monitor stopping");
                        break;
                    }
                }
            }
            log::info!("clipboard session counters:\n{}", self.stats.snapshot());
        });

        MonitorHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Ask the loop to stop. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the loop task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interceptor::{InterceptionEngine, LogSurface};
    use std::time::Instant;

    struct FailingClipboard;

    impl ClipboardSource for FailingClipboard {
        fn read_text(&mut self) -> ClipboardRead<'_> {
            Box::pin(async { Err(anyhow!("clipboard access denied")) })
        }
    }

    fn mock_engine() -> Arc<InterceptionEngine> {
        let config = Config {
            use_mock: true,
            ..Config::default()
        };
        Arc::new(InterceptionEngine::new(&config, Arc::new(LogSurface)))
    }

    fn hung_tool_source(read_timeout: Duration) -> CommandClipboard {
        // `sleep` stands in for a paste tool whose selection owner never
        // answers: it produces no output and never exits on its own.
        CommandClipboard {
            program: "sleep",
            args: &["30"],
            read_timeout,
        }
    }

    #[tokio::test]
    async fn test_duplicate_values_scan_once() {
        let source = ScriptedClipboard::new(vec!["http://a", "http://a", "http://b"]);
        let mut monitor = ClipboardMonitor::new(mock_engine(), Box::new(source));

        let mut dispatched = Vec::new();
        for _ in 0..3 {
            dispatched.push(monitor.poll_once().await);
        }

        // Two distinct values, so exactly two scans.
        assert_eq!(dispatched, vec![true, false, true]);
        let snap = monitor.stats.snapshot();
        assert_eq!(snap.clipboard_ticks, 3);
        assert_eq!(snap.clipboard_duplicates, 1);
    }

    #[tokio::test]
    async fn test_non_link_text_updates_key_without_scanning() {
        let source = ScriptedClipboard::new(vec!["meeting notes", "meeting notes"]);
        let mut monitor = ClipboardMonitor::new(mock_engine(), Box::new(source));

        assert!(!monitor.poll_once().await);
        assert!(!monitor.poll_once().await);

        // The second read was recognized as a repeat: the key updated on
        // the first one even though nothing was scanned.
        assert_eq!(monitor.stats.snapshot().clipboard_duplicates, 1);
    }

    #[tokio::test]
    async fn test_empty_reads_do_not_clear_the_key() {
        let source = ScriptedClipboard::new(vec!["http://a", "", "http://a"]);
        let mut monitor = ClipboardMonitor::new(mock_engine(), Box::new(source));

        assert!(monitor.poll_once().await);
        assert!(!monitor.poll_once().await);
        assert!(!monitor.poll_once().await);

        let snap = monitor.stats.snapshot();
        assert_eq!(snap.clipboard_duplicates, 1);
    }

    #[tokio::test]
    async fn test_read_errors_do_not_kill_the_loop() {
        let mut monitor = ClipboardMonitor::new(mock_engine(), Box::new(FailingClipboard));

        assert!(!monitor.poll_once().await);
        assert!(!monitor.poll_once().await);

        assert_eq!(monitor.stats.snapshot().clipboard_ticks, 2);
    }

    #[tokio::test]
    async fn test_hung_tool_read_hits_its_deadline() {
        let mut source = hung_tool_source(Duration::from_millis(50));

        let started = Instant::now();
        let result = source.read_text().await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("did not answer"));
        // The read must come back at the deadline, not when the tool exits.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_hung_tool_does_not_stall_the_loop() {
        let source = hung_tool_source(Duration::from_millis(50));
        let mut monitor = ClipboardMonitor::new(mock_engine(), Box::new(source));

        assert!(!monitor.poll_once().await);
        assert!(!monitor.poll_once().await);

        // Both ticks completed despite the tool never answering.
        assert_eq!(monitor.stats.snapshot().clipboard_ticks, 2);
    }

    #[tokio::test]
    async fn test_spawned_monitor_scans_and_shuts_down() {
        let engine = mock_engine();
        let stats = engine.stats();
        let source = ScriptedClipboard::new(vec!["http://phishing-test.example"]);
        let monitor = ClipboardMonitor::new(engine, Box::new(source));

        let mut handle = monitor.spawn(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown();
        handle.join().await;

        assert!(stats.snapshot().dispatched >= 1);
    }

    #[tokio::test]
    async fn test_scripted_source_drains_then_reads_empty() {
        let mut source = ScriptedClipboard::new(vec!["one"]);
        assert_eq!(source.read_text().await.unwrap(), Some("one".to_string()));
        assert_eq!(source.read_text().await.unwrap(), None);
        assert_eq!(source.read_text().await.unwrap(), None);
    }
}
