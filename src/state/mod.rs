//! State module for tracking crawl progress
//!
//! This module provides the session lifecycle and the state shared by every
//! component working on one session.
//!
//! # Components
//!
//! - `SessionState`: Lifecycle of a crawl session (idle, running, finished, aborted)
//! - `CrawlSession`: Identity, limits and progress of one crawl run
//! - `VisitedSet` / `ScoreCache`: Synchronized per-session URL bookkeeping
//! - `StagnationTracker`: Detects when triple ingestion has stopped growing

mod engine_state;
mod session;

// Re-export main types
pub use engine_state::SessionState;
pub use session::{
    crawl_id, CrawlSession, ScoreCache, SessionLimits, StagnationTracker, StopReason, VisitedSet,
};
