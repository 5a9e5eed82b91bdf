//! Canonical catalog record and the raw entry it is normalized from.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the detail URL digest.
const RECORD_ID_LEN: usize = 16;

/// A validated, typed catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// Stable key derived from the detail URL.
    pub id: String,
    /// Entry title (never empty).
    pub title: String,
    /// Price in the source currency (never negative).
    pub price: f64,
    /// Whether the availability text reports the entry as in stock.
    pub in_stock: bool,
    /// Rating from 0 (unknown) to 5.
    pub rating: u8,
    /// Absolute URL of the entry's detail page.
    pub detail_url: String,
    /// Absolute URL of the thumbnail image, or empty.
    pub thumbnail_url: String,
    /// Availability text as shown by the source, whitespace-collapsed.
    pub availability_text: String,
}

impl CatalogRecord {
    /// Case-folded title used for substring search.
    ///
    /// Both catalog backends fold titles through this method so that search
    /// results are identical regardless of where the catalog lives.
    pub fn folded_title(&self) -> String {
        fold_search_text(&self.title)
    }
}

/// Case folding applied to titles and search text alike.
pub fn fold_search_text(text: &str) -> String {
    text.to_lowercase()
}

/// Derive the stable record id for an absolute detail URL.
pub fn record_id_for(detail_url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(detail_url.as_bytes()));
    digest[..RECORD_ID_LEN].to_string()
}

/// One entry as extracted from a listing page, before validation.
///
/// Every field is optional: the extractor records what it found and leaves
/// judgement to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub price_text: Option<String>,
    pub availability: Option<String>,
    pub rating_class: Option<String>,
    pub detail_href: Option<String>,
    pub thumbnail_href: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_is_deterministic() {
        let a = record_id_for("https://books.toscrape.com/catalogue/sapiens_996/index.html");
        let b = record_id_for("https://books.toscrape.com/catalogue/sapiens_996/index.html");
        assert_eq!(a, b);
        assert_eq!(a.len(), RECORD_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_record_id_differs_per_url() {
        let a = record_id_for("https://example.com/a");
        let b = record_id_for("https://example.com/b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = CatalogRecord {
            id: "abc".to_string(),
            title: "Sapiens".to_string(),
            price: 24.99,
            in_stock: true,
            rating: 4,
            detail_url: "https://example.com/sapiens".to_string(),
            thumbnail_url: String::new(),
            availability_text: "In stock".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["inStock"], true);
        assert_eq!(json["detailUrl"], "https://example.com/sapiens");
        assert_eq!(json["availabilityText"], "In stock");

        let parsed: CatalogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_folded_title() {
        let record = CatalogRecord {
            id: "x".to_string(),
            title: "The GRAND Design".to_string(),
            price: 0.0,
            in_stock: false,
            rating: 0,
            detail_url: "https://example.com/x".to_string(),
            thumbnail_url: String::new(),
            availability_text: String::new(),
        };
        assert_eq!(record.folded_title(), "the grand design");
    }
}
