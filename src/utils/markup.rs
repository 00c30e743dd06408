//! Read-only markup queries over a parsed HTML document.
//!
//! Discovery and detail resolution only ever need three things from a page:
//! all elements matching a selector, the text of an element, and an
//! attribute with a fallback. Everything `scraper`-specific stays here.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};

/// A parsed HTML document.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }

    /// Text content of an element with whitespace runs collapsed.
    pub fn text_of(element: &ElementRef<'_>) -> String {
        let raw: String = element.text().collect();
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Attribute value, or `default` when absent.
    pub fn attr(element: &ElementRef<'_>, name: &str, default: &str) -> String {
        element.value().attr(name).unwrap_or(default).to_string()
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
