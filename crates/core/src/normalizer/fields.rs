//! Field-level coercion rules.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Longest leading decimal number (`12`, `12.5`, `.5`, `12.`).
static DECIMAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)").unwrap());

/// Marker class shared by every rating element.
const RATING_MARKER_CLASS: &str = "star-rating";

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Parse a currency-formatted price such as `£24.99`.
///
/// Every character other than digits and `.` is stripped and the longest
/// leading decimal is parsed. Text without numeric content yields 0.
pub fn parse_price(text: &str) -> f64 {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    DECIMAL_PREFIX
        .find(&numeric)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|price| price.is_finite())
        .unwrap_or(0.0)
}

/// Map a rating class list (`star-rating Four`) to 1-5, or 0 when unknown.
pub fn parse_rating(class_list: &str) -> u8 {
    let word = class_list
        .split_whitespace()
        .find(|token| *token != RATING_MARKER_CLASS)
        .unwrap_or("");

    match word {
        "One" => 1,
        "Two" => 2,
        "Three" => 3,
        "Four" => 4,
        "Five" => 5,
        _ => 0,
    }
}

/// Whether the availability text reports the entry as in stock.
pub fn parse_in_stock(availability: &str) -> bool {
    availability.to_lowercase().contains("in stock")
}
