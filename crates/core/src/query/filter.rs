//! The catalog predicate, defined once and rendered for each backend.
//!
//! [`Filter::matches`] is what the snapshot backend evaluates in memory;
//! [`Filter::to_sql`] renders the same conditions for the SQLite backend.
//! Both compare search text against the title after [`fold_search_text`].

use rusqlite::types::Value;

use super::Query;
use crate::record::{fold_search_text, CatalogRecord};

/// The filter part of a [`Query`], with the search needle pre-folded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<u8>,
    pub in_stock: Option<bool>,
    /// Folded search text.
    pub needle: Option<String>,
}

/// A rendered SQL condition plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    /// Conditions joined with `AND`; `"1"` when there are none.
    pub clause: String,
    pub params: Vec<Value>,
}

impl Filter {
    pub fn from_query(query: &Query) -> Self {
        Self {
            min_price: query.min_price.filter(|p| p.is_finite()),
            max_price: query.max_price.filter(|p| p.is_finite()),
            min_rating: query.min_rating,
            in_stock: query.in_stock,
            needle: query
                .search
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(fold_search_text),
        }
    }

    pub fn matches(&self, record: &CatalogRecord) -> bool {
        if let Some(min) = self.min_price {
            if record.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if record.price > max {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if record.rating < min {
                return false;
            }
        }
        if let Some(in_stock) = self.in_stock {
            if record.in_stock != in_stock {
                return false;
            }
        }
        if let Some(needle) = &self.needle {
            if !record.folded_title().contains(needle.as_str()) {
                return false;
            }
        }
        true
    }

    /// Render as a `WHERE` clause over `catalog_records` columns.
    pub fn to_sql(&self) -> SqlFilter {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(min) = self.min_price {
            conditions.push("price >= ?");
            params.push(Value::Real(min));
        }
        if let Some(max) = self.max_price {
            conditions.push("price <= ?");
            params.push(Value::Real(max));
        }
        if let Some(min) = self.min_rating {
            conditions.push("rating >= ?");
            params.push(Value::Integer(i64::from(min)));
        }
        if let Some(in_stock) = self.in_stock {
            conditions.push("in_stock = ?");
            params.push(Value::Integer(i64::from(in_stock)));
        }
        if let Some(needle) = &self.needle {
            // instr() is a byte-exact match; both sides are folded in Rust.
            conditions.push("instr(title_folded, ?) > 0");
            params.push(Value::Text(needle.clone()));
        }

        let clause = if conditions.is_empty() {
            "1".to_string()
        } else {
            conditions.join(" AND ")
        };

        SqlFilter { clause, params }
    }
}
