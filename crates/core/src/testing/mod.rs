//! Testing utilities: a scripted fetcher and catalog fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use shelfscan_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.set_page(
//!     "https://shop.test/catalogue/page-1.html",
//!     fixtures::listing_page(&[fixtures::ListingEntry::new("Dune", "dune/index.html", "£9.00", "Four", true)], None),
//! );
//! ```

mod mock_fetcher;

pub use mock_fetcher::MockFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::record::{record_id_for, CatalogRecord};

    /// Create a catalog record with reasonable defaults.
    pub fn record(
        title: &str,
        detail_url: &str,
        price: f64,
        rating: u8,
        in_stock: bool,
    ) -> CatalogRecord {
        CatalogRecord {
            id: record_id_for(detail_url),
            title: title.to_string(),
            price,
            in_stock,
            rating,
            detail_url: detail_url.to_string(),
            thumbnail_url: format!("{}/cover.jpg", detail_url.trim_end_matches('/')),
            availability_text: if in_stock { "In stock" } else { "Out of stock" }.to_string(),
        }
    }

    /// Five records with mixed price, rating and stock.
    ///
    /// | title               | price | rating | in stock |
    /// |---------------------|-------|--------|----------|
    /// | A Light in the Attic| 51.77 | 3      | yes      |
    /// | Tipping the Velvet  | 13.99 | 1      | yes      |
    /// | Soumission          | 20.00 | 4      | no       |
    /// | Sharp Objects       | 29.99 | 4      | yes      |
    /// | Sapiens             | 24.99 | 5      | yes      |
    pub fn mixed_records() -> Vec<CatalogRecord> {
        let base = "https://shop.test/catalogue";
        vec![
            record("A Light in the Attic", &format!("{base}/a-light-in-the-attic_1000/index.html"), 51.77, 3, true),
            record("Tipping the Velvet", &format!("{base}/tipping-the-velvet_999/index.html"), 13.99, 1, true),
            record("Soumission", &format!("{base}/soumission_998/index.html"), 20.00, 4, false),
            record("Sharp Objects", &format!("{base}/sharp-objects_997/index.html"), 29.99, 4, true),
            record("Sapiens", &format!("{base}/sapiens_996/index.html"), 24.99, 5, true),
        ]
    }

    /// One product pod on a listing page.
    #[derive(Debug, Clone)]
    pub struct ListingEntry {
        pub title: String,
        pub href: String,
        pub price: String,
        pub rating_word: String,
        pub in_stock: bool,
    }

    impl ListingEntry {
        pub fn new(title: &str, href: &str, price: &str, rating_word: &str, in_stock: bool) -> Self {
            Self {
                title: title.to_string(),
                href: href.to_string(),
                price: price.to_string(),
                rating_word: rating_word.to_string(),
                in_stock,
            }
        }
    }

    /// Render a listing page in product-pod markup.
    pub fn listing_page(entries: &[ListingEntry], next_href: Option<&str>) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html><head><title>All products</title></head><body>\n<section><ol class=\"row\">\n");

        for entry in entries {
            let availability = if entry.in_stock { "In stock" } else { "Out of stock" };
            let short_title: String = entry.title.chars().take(20).collect();
            html.push_str(&format!(
                r#"<li class="col-xs-6"><article class="product_pod">
  <div class="image_container"><a href="{href}"><img src="../media/cache/{slug}.jpg" alt="{title}" class="thumbnail"></a></div>
  <p class="star-rating {rating}"><i class="icon-star"></i></p>
  <h3><a href="{href}" title="{title}">{short}</a></h3>
  <div class="product_price">
    <p class="price_color">{price}</p>
    <p class="instock availability">
        <i class="icon-ok"></i>
        {availability}
    </p>
  </div>
</article></li>
"#,
                href = escape(&entry.href),
                slug = escape(entry.href.trim_end_matches("/index.html")),
                title = escape(&entry.title),
                short = escape(&short_title),
                rating = escape(&entry.rating_word),
                price = escape(&entry.price),
                availability = availability,
            ));
        }

        html.push_str("</ol>\n<div><ul class=\"pager\">\n<li class=\"current\">Page</li>\n");
        if let Some(next) = next_href {
            html.push_str(&format!(
                "<li class=\"next\"><a href=\"{}\">next</a></li>\n",
                escape(next)
            ));
        }
        html.push_str("</ul></div></section>\n</body></html>\n");
        html
    }

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }
}
