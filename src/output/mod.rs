//! Output module for harvest reports and exports
//!
//! This module handles:
//! - Writing exported provenance graphs and store exports to disk
//! - Loading and printing per-session statistics from the ledger

mod export;
pub mod stats;

pub use export::{graph_file_name, provenance_file_name, write_graph_export, write_provenance_file};
pub use stats::{load_statistics, print_statistics, SessionStatistics};
