// src/pipeline/mod.rs

//! Pipeline entry points for scanner operations.
//!
//! - `Scanner::run`: one crawl cycle over the current listing page
//! - `watch`: repeat cycles on a fixed interval

pub mod scan;
pub mod watch;

pub use scan::{CycleOutcome, CycleStats, Scanner, ScannerBuilder};
pub use watch::watch;
