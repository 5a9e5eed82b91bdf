//! Record normalizer: raw extracted entry → canonical [`CatalogRecord`].
//!
//! Normalization is deterministic. Lossy coercions (a price without digits,
//! an unknown rating word) produce defaults; only a missing title or an
//! unusable locator rejects the entry.

mod fields;

pub use fields::{collapse_whitespace, parse_in_stock, parse_price, parse_rating};

use thiserror::Error;
use url::Url;

use crate::record::{record_id_for, CatalogRecord, RawEntry};

/// Why a raw entry could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid locator in {field} ({value}): {reason}")]
    InvalidLocator {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl NormalizationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => *field,
            Self::InvalidLocator { field, .. } => *field,
        }
    }
}

/// Normalize one raw entry extracted from the page at `page_url`.
pub fn normalize(entry: &RawEntry, page_url: &Url) -> Result<CatalogRecord, NormalizationError> {
    let title = entry
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .ok_or(NormalizationError::MissingField { field: "title" })?;

    let detail_href = entry
        .detail_href
        .as_deref()
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or(NormalizationError::MissingField {
            field: "detail_url",
        })?;
    let detail_url = resolve_locator("detail_url", detail_href, page_url)?;

    let thumbnail_url = match entry
        .thumbnail_href
        .as_deref()
        .map(str::trim)
        .filter(|href| !href.is_empty())
    {
        Some(href) => resolve_locator("thumbnail_url", href, page_url)?,
        None => String::new(),
    };

    let availability_text = entry
        .availability
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_default();

    Ok(CatalogRecord {
        id: record_id_for(&detail_url),
        title,
        price: entry.price_text.as_deref().map(parse_price).unwrap_or(0.0),
        in_stock: parse_in_stock(&availability_text),
        rating: entry.rating_class.as_deref().map(parse_rating).unwrap_or(0),
        detail_url,
        thumbnail_url,
        availability_text,
    })
}

/// Resolve `href` against the page it was found on.
fn resolve_locator(
    field: &'static str,
    href: &str,
    page_url: &Url,
) -> Result<String, NormalizationError> {
    let resolved = page_url
        .join(href)
        .map_err(|e| NormalizationError::InvalidLocator {
            field,
            value: href.to_string(),
            reason: e.to_string(),
        })?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.to_string()),
        other => Err(NormalizationError::InvalidLocator {
            field,
            value: href.to_string(),
            reason: format!("unsupported scheme: {}", other),
        }),
    }
}
