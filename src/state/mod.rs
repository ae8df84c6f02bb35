//! State module for the incremental update check
//!
//! # Components
//!
//! - `CrawlState`: freshness baseline of the transaction report
//! - `CrawlStateStore`: load/save access to that baseline, `FileStateStore` on disk
//! - Update gate: decides whether a full transaction crawl is needed

mod crawl_state;
pub mod gate;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlStateStore, FileStateStore, StateError, StateResult};
pub use gate::{decide, run_gate, should_crawl, GateDecision, GateReason};
