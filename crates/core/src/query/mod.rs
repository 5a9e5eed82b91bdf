//! Query engine over the published catalog generation.

mod engine;
mod filter;
mod types;

pub use engine::QueryEngine;
pub use filter::{Filter, SqlFilter};
pub use types::*;
