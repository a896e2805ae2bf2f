//! Session counters
//!
//! Lightweight in-process tallies for scans and decisions. Shared behind an
//! `Arc` by the engine and the clipboard monitor; read with `snapshot()`.
//! Nothing here is persisted.

use crate::policy::PolicyAction;
use crate::verdict::Confidence;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ScanStats {
    dispatched: AtomicU64,
    scan_attempts: AtomicU64,
    exact: AtomicU64,
    heuristic: AtomicU64,
    unavailable: AtomicU64,
    blocked: AtomicU64,
    warned: AtomicU64,
    allowed: AtomicU64,
    clipboard_ticks: AtomicU64,
    clipboard_duplicates: AtomicU64,
}

impl ScanStats {
    pub fn new() -> Self {
        ScanStats::default()
    }

    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// One network attempt within a scan. Retries record once per try, so
    /// this can run ahead of `dispatched`.
    pub fn record_scan_attempt(&self) {
        self.scan_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verdict(&self, confidence: Confidence) {
        let counter = match confidence {
            Confidence::Exact => &self.exact,
            Confidence::Heuristic => &self.heuristic,
            Confidence::Unavailable => &self.unavailable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self, action: PolicyAction) {
        let counter = match action {
            PolicyAction::Block => &self.blocked,
            PolicyAction::Warn => &self.warned,
            PolicyAction::Allow => &self.allowed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clipboard_tick(&self) {
        self.clipboard_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_clipboard_duplicate(&self) {
        self.clipboard_duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            scan_attempts: self.scan_attempts.load(Ordering::Relaxed),
            exact: self.exact.load(Ordering::Relaxed),
            heuristic: self.heuristic.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            warned: self.warned.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            clipboard_ticks: self.clipboard_ticks.load(Ordering::Relaxed),
            clipboard_duplicates: self.clipboard_duplicates.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub dispatched: u64,
    pub scan_attempts: u64,
    pub exact: u64,
    pub heuristic: u64,
    pub unavailable: u64,
    pub blocked: u64,
    pub warned: u64,
    pub allowed: u64,
    pub clipboard_ticks: u64,
    pub clipboard_duplicates: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scans dispatched:     {}", self.dispatched)?;
        writeln!(f, "Network attempts:     {}", self.scan_attempts)?;
        writeln!(
            f,
            "Verdicts:             {} exact, {} heuristic, {} unavailable",
            self.exact, self.heuristic, self.unavailable
        )?;
        writeln!(
            f,
            "Decisions:            {} blocked, {} warned, {} allowed",
            self.blocked, self.warned, self.allowed
        )?;
        write!(
            f,
            "Clipboard:            {} ticks, {} duplicates skipped",
            self.clipboard_ticks, self.clipboard_duplicates
        )
    }
}
