//! Session audit log.
//!
//! Counts what the monitor received, kept and dropped so a session can be
//! reviewed afterwards. No sensor values are stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Disclaimer shown with every session summary.
pub const CLINICAL_DISCLAIMER: &str = "\
Classifications are threshold comparisons over raw sensor codes.\n\
This tool is a visualization aid, not a medical device.";

/// Audit counters for the current session.
#[derive(Debug)]
pub struct AuditLog {
    /// Updates delivered by the feed
    payloads_received: AtomicU64,
    /// Updates turned into samples
    samples_accepted: AtomicU64,
    /// Updates ignored as absent or malformed
    payloads_skipped: AtomicU64,
    /// Samples pushed out of the window
    samples_evicted: AtomicU64,
    /// Reports written to disk
    reports_exported: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    /// Create a new audit log.
    pub fn new() -> Self {
        Self {
            payloads_received: AtomicU64::new(0),
            samples_accepted: AtomicU64::new(0),
            payloads_skipped: AtomicU64::new(0),
            samples_evicted: AtomicU64::new(0),
            reports_exported: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log that accumulates across sessions on disk.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("could not load previous audit stats: {e}");
        }

        log
    }

    /// Record an accepted sample and how many old samples it evicted.
    pub fn record_accepted(&self, evicted: usize) {
        self.payloads_received.fetch_add(1, Ordering::Relaxed);
        self.samples_accepted.fetch_add(1, Ordering::Relaxed);
        self.samples_evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
    }

    /// Record an update that was ignored.
    pub fn record_skipped(&self) {
        self.payloads_received.fetch_add(1, Ordering::Relaxed);
        self.payloads_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an exported report.
    pub fn record_report_exported(&self) {
        self.reports_exported.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> AuditStats {
        AuditStats {
            payloads_received: self.payloads_received.load(Ordering::Relaxed),
            samples_accepted: self.samples_accepted.load(Ordering::Relaxed),
            payloads_skipped: self.payloads_skipped.load(Ordering::Relaxed),
            samples_evicted: self.samples_evicted.load(Ordering::Relaxed),
            reports_exported: self.reports_exported.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Updates received: {}\n\
             - Samples accepted: {}\n\
             - Updates skipped: {}\n\
             - Samples evicted from window: {}\n\
             - Reports exported: {}\n\
             - Session duration: {} seconds\n\
             \n\
             {}",
            stats.payloads_received,
            stats.samples_accepted,
            stats.payloads_skipped,
            stats.samples_evicted,
            stats.reports_exported,
            stats.session_duration_secs,
            CLINICAL_DISCLAIMER
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                payloads_received: stats.payloads_received,
                samples_accepted: stats.samples_accepted,
                payloads_skipped: stats.payloads_skipped,
                samples_evicted: stats.samples_evicted,
                reports_exported: stats.reports_exported,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.payloads_received
                    .store(persisted.payloads_received, Ordering::Relaxed);
                self.samples_accepted
                    .store(persisted.samples_accepted, Ordering::Relaxed);
                self.payloads_skipped
                    .store(persisted.payloads_skipped, Ordering::Relaxed);
                self.samples_evicted
                    .store(persisted.samples_evicted, Ordering::Relaxed);
                self.reports_exported
                    .store(persisted.reports_exported, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of audit statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub payloads_received: u64,
    pub samples_accepted: u64,
    pub payloads_skipped: u64,
    pub samples_evicted: u64,
    pub reports_exported: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    payloads_received: u64,
    samples_accepted: u64,
    payloads_skipped: u64,
    samples_evicted: u64,
    reports_exported: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

/// Create a new shared audit log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}
