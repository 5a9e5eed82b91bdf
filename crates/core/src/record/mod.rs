//! Catalog record model.
//!
//! A crawl turns [`RawEntry`] values into [`CatalogRecord`]s, stages them in a
//! [`GenerationBuilder`] and seals them into an immutable [`Generation`].

mod generation;
mod types;

pub use generation::{DuplicateRecord, Generation, GenerationBuilder, GenerationInfo};
pub use types::*;
