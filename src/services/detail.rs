// src/services/detail.rs

//! Detail page resolution.
//!
//! A work's card page carries the author name in its author data table and
//! one or more archive links in its download table.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{DetailInfo, LinkPolicy};
use crate::utils::url::join_on_directory;
use crate::utils::{Fetcher, Page};

/// Second cell of the first row of the author data table.
const AUTHOR_NAME_SELECTOR: &str =
    r#"table[summary="作家データ"] tr:nth-child(1) td:nth-child(2)"#;

/// Second cell of the first row of the title data table.
const TITLE_SELECTOR: &str = r#"table[summary="タイトルデータ"] tr:nth-child(1) td:nth-child(2)"#;

/// Anchors in the download table.
const DOWNLOAD_LINK_SELECTOR: &str = "table.download a";

/// Service that reads author name and archive location from a detail page.
pub struct DetailResolver {
    fetcher: Arc<dyn Fetcher>,
    archive_extension: String,
    policy: LinkPolicy,
}

impl DetailResolver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        archive_extension: impl Into<String>,
        policy: LinkPolicy,
    ) -> Self {
        Self {
            fetcher,
            archive_extension: archive_extension.into(),
            policy,
        }
    }

    /// Fetch a detail page and resolve what it says about the work.
    pub async fn resolve(&self, detail_url: &str) -> Result<DetailInfo> {
        let html = self.fetcher.get_text(detail_url).await?;
        parse_detail(&html, detail_url, &self.archive_extension, self.policy)
    }
}

/// Extract author, title and archive location from detail page markup.
///
/// Missing tables yield empty strings; no matching download link yields
/// `archive_url: None`.
pub fn parse_detail(
    html: &str,
    detail_url: &str,
    archive_extension: &str,
    policy: LinkPolicy,
) -> Result<DetailInfo> {
    let page = Page::parse(html);

    let author_name = first_text(&page, AUTHOR_NAME_SELECTOR)?;
    let title = first_text(&page, TITLE_SELECTOR)?;

    let mut candidates = page
        .select_all(DOWNLOAD_LINK_SELECTOR)?
        .into_iter()
        .map(|anchor| Page::attr(&anchor, "href", ""))
        .filter(|href| href.trim().ends_with(archive_extension));

    let href = match policy {
        LinkPolicy::First => candidates.next(),
        LinkPolicy::Last => candidates.last(),
    };

    let archive_url = href
        .map(|href| join_on_directory(detail_url, &href))
        .transpose()?;

    Ok(DetailInfo {
        author_name,
        title,
        archive_url,
    })
}

fn first_text(page: &Page, selector: &str) -> Result<String> {
    Ok(page
        .select_all(selector)?
        .first()
        .map(Page::text_of)
        .unwrap_or_default())
}
