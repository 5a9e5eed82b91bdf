//! Page extractor: one listing page → raw entries + next-page locator.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::{ExtractedPage, PageParseError, SelectorConfig};
use crate::record::RawEntry;

/// Turns the content of one fetched page into raw entries.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, content: &str, page_url: &Url) -> Result<ExtractedPage, PageParseError>;
}

/// A configured selector that does not parse.
#[derive(Debug, Clone, Error)]
#[error("invalid selector for {name} (`{selector}`): {reason}")]
pub struct SelectorError {
    pub name: &'static str,
    pub selector: String,
    pub reason: String,
}

/// Extractor for product-pod listing markup.
///
/// ```text
/// <ol class="row">
///   <li><article class="product_pod">
///     <div class="image_container"><a href="..."><img src="thumb.jpg"></a></div>
///     <p class="star-rating Three"></p>
///     <h3><a href="detail.html" title="Full Title">Full Ti...</a></h3>
///     <div class="product_price">
///       <p class="price_color">£51.77</p>
///       <p class="instock availability">In stock</p>
///     </div>
///   </article></li>
/// </ol>
/// <ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>
/// ```
#[derive(Debug)]
pub struct ProductPodExtractor {
    listing: Selector,
    entry: Selector,
    title_link: Selector,
    price: Selector,
    availability: Selector,
    rating: Selector,
    thumbnail: Selector,
    next_page: Selector,
    listing_source: String,
}

impl ProductPodExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            listing: compile("listing", &selectors.listing)?,
            entry: compile("entry", &selectors.entry)?,
            title_link: compile("title_link", &selectors.title_link)?,
            price: compile("price", &selectors.price)?,
            availability: compile("availability", &selectors.availability)?,
            rating: compile("rating", &selectors.rating)?,
            thumbnail: compile("thumbnail", &selectors.thumbnail)?,
            next_page: compile("next_page", &selectors.next_page)?,
            listing_source: selectors.listing.clone(),
        })
    }

    /// Extract one entry element; `None` when it lacks the title link.
    fn extract_entry(&self, element: ElementRef<'_>) -> Option<RawEntry> {
        let link = element.select(&self.title_link).next()?;

        let title = link
            .value()
            .attr("title")
            .map(str::to_string)
            .or_else(|| Some(element_text(link)));

        Some(RawEntry {
            title,
            price_text: element.select(&self.price).next().map(element_text),
            availability: element.select(&self.availability).next().map(element_text),
            rating_class: element
                .select(&self.rating)
                .next()
                .and_then(|e| e.value().attr("class"))
                .map(str::to_string),
            detail_href: link.value().attr("href").map(str::to_string),
            thumbnail_href: element
                .select(&self.thumbnail)
                .next()
                .and_then(|e| e.value().attr("src"))
                .map(str::to_string),
        })
    }
}

impl PageExtractor for ProductPodExtractor {
    fn extract(&self, content: &str, page_url: &Url) -> Result<ExtractedPage, PageParseError> {
        if content.trim().is_empty() {
            return Err(PageParseError::Empty);
        }

        let document = Html::parse_document(content);

        if document.select(&self.listing).next().is_none() {
            return Err(PageParseError::MissingListing(self.listing_source.clone()));
        }

        let mut page = ExtractedPage::default();
        for element in document.select(&self.entry) {
            match self.extract_entry(element) {
                Some(entry) => page.entries.push(entry),
                None => {
                    page.skipped += 1;
                    debug!(url = %page_url, "Skipping entry without title link");
                }
            }
        }

        let next_href = document
            .select(&self.next_page)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty());

        if let Some(href) = next_href {
            let next = page_url
                .join(href)
                .map_err(|e| PageParseError::InvalidNextLocator {
                    href: href.to_string(),
                    reason: e.to_string(),
                })?;
            page.next_page = Some(next);
        }

        Ok(page)
    }
}

fn compile(name: &'static str, selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        name,
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
