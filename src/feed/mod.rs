//! Inbound sensor feed.
//!
//! The feed is an opaque upstream push source. This module provides the raw
//! payload types it delivers, an owned subscription resource, and a replay
//! source for recorded sessions.

pub mod payload;
pub mod replay;
pub mod subscription;

// Re-export commonly used types
pub use payload::{RawChannel, RawFlexGroup, RawImu, RawPayload};
pub use replay::{read_line_lossy, ReplaySource};
pub use subscription::{
    FeedError, FeedSink, FeedSource, FeedUpdate, Subscription, DEFAULT_FEED_CAPACITY,
};
