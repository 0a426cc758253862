use regex::Regex;
use scraper::{Html, Selector};

use crate::models::StockObservation;

/// Structured stock status embedded in the page's JSON blobs. Preferred over
/// free-text scanning, which false-positives on unrelated page copy.
const STOCK_TXT_PATTERN: &str = r#"(?i)"stock_txt"\s*:\s*"([^"]+)""#;

/// Markers that classify the structured `stock_txt` value as out of stock.
/// "หมด" is the Thai "depleted" marker used by the monitored shops.
const STOCK_TXT_NEGATIVE: [&str; 2] = ["sold out", "หมด"];

/// Free-text phrases that classify a page without a `stock_txt` field as out
/// of stock. English markers are matched case-insensitively; "สินค้าหมด" is
/// the Thai out-of-stock phrase and is matched as-is.
const PAGE_TEXT_NEGATIVE: [&str; 2] = ["sold out", "pre-order"];
const PAGE_TEXT_NEGATIVE_TH: &str = "สินค้าหมด";

/// Turns raw product-page markup into a binary availability signal plus a
/// display name and optional image.
///
/// The heuristic is ordered and the first match wins:
/// 1. `og:title` for the display name, falling back to a fixed default.
/// 2. The first `"stock_txt"` field, lower-cased, checked for negative
///    markers.
/// 3. Only if that field is absent: the page's visible text, with the product
///    name removed first so a trigger word inside the name itself cannot
///    misclassify the page.
///
/// Absence of any negative signal classifies as in stock. That bias is
/// deliberate: the heuristic always yields a boolean, never an error.
#[derive(Debug, Clone)]
pub struct StockClassifier {
    fallback_name: String,
    stock_txt: Regex,
}

impl StockClassifier {
    pub fn new(fallback_name: impl Into<String>) -> Self {
        Self {
            fallback_name: fallback_name.into(),
            stock_txt: Regex::new(STOCK_TXT_PATTERN).expect("stock_txt pattern is valid"),
        }
    }

    pub fn classify(&self, html: &str) -> StockObservation {
        let document = Html::parse_document(html);

        let display_name =
            og_content(&document, "og:title").unwrap_or_else(|| self.fallback_name.clone());
        let image_url = og_content(&document, "og:image");

        let in_stock = match self.stock_txt.captures(html) {
            Some(captures) => {
                let value = captures[1].to_lowercase();
                !STOCK_TXT_NEGATIVE.iter().any(|marker| value.contains(marker))
            }
            None => self.scan_page_text(&document, &display_name),
        };

        StockObservation {
            in_stock,
            display_name,
            image_url,
        }
    }

    fn scan_page_text(&self, document: &Html, display_name: &str) -> bool {
        let page_text: String = document.root_element().text().collect();
        // Strip the product name so a name like "SOLD OUT Edition" does not
        // flag the whole page.
        let without_name = page_text.replace(display_name, "");
        let lowered = without_name.to_lowercase();

        let negative = PAGE_TEXT_NEGATIVE
            .iter()
            .any(|marker| lowered.contains(marker))
            || without_name.contains(PAGE_TEXT_NEGATIVE_TH);

        !negative
    }
}

fn og_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(str::to_string)
}
