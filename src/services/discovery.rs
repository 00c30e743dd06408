// src/services/discovery.rs

//! Entry discovery.
//!
//! Reads a catalog listing page and turns every work card link into a
//! [`WorkDescriptor`]. Navigation links on the same page are ignored.

use std::sync::Arc;

use crate::error::Result;
use crate::models::WorkDescriptor;
use crate::utils::url::{card_url, match_card_link};
use crate::utils::{Fetcher, Page};

/// Anchors inside ordered lists carry the work links.
const WORK_LINK_SELECTOR: &str = "ol li a";

/// Service that enumerates works on a listing page.
pub struct EntryDiscoverer {
    fetcher: Arc<dyn Fetcher>,
    site_base: String,
}

impl EntryDiscoverer {
    pub fn new(fetcher: Arc<dyn Fetcher>, site_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            site_base: site_base.into(),
        }
    }

    /// Fetch the listing page and extract its works.
    pub async fn discover(&self, listing_url: &str) -> Result<Vec<WorkDescriptor>> {
        let html = self.fetcher.get_text(listing_url).await?;
        let works = parse_listing(&html, &self.site_base)?;
        log::debug!("Found {} work links on {}", works.len(), listing_url);
        Ok(works)
    }
}

/// Extract work descriptors from listing markup, in document order.
///
/// Detail URLs are rebuilt from the captured identifiers rather than taken
/// from the href. Duplicate keys are kept.
pub fn parse_listing(html: &str, site_base: &str) -> Result<Vec<WorkDescriptor>> {
    let page = Page::parse(html);
    let works = page
        .select_all(WORK_LINK_SELECTOR)?
        .iter()
        .filter_map(|anchor| {
            let href = Page::attr(anchor, "href", "");
            let (author_id, title_id) = match_card_link(&href)?;
            let detail_url = card_url(site_base, &author_id, &title_id);
            Some(WorkDescriptor::discovered(
                author_id,
                title_id,
                Page::text_of(anchor),
                detail_url,
            ))
        })
        .collect();
    Ok(works)
}
