//! Audit module for the hand rehabilitation monitor.
//!
//! Tracks how many feed updates were received, kept and dropped during a
//! monitoring session.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log_with_persistence, AuditLog, AuditStats, SharedAuditLog, CLINICAL_DISCLAIMER,
};
