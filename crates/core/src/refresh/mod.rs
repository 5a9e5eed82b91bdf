//! Refresh orchestrator.
//!
//! A refresh is a full re-crawl: the crawler stages every record, the
//! staged set is sealed into a generation, and the generation is published
//! in one atomic step. Failed or cancelled crawls publish nothing.

mod orchestrator;
mod types;

pub use orchestrator::RefreshOrchestrator;
pub use types::*;
