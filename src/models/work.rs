//! Work, author and content data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a work: `(author_id, title_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkKey {
    pub author_id: String,
    pub title_id: String,
}

impl WorkKey {
    pub fn new(author_id: impl Into<String>, title_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            title_id: title_id.into(),
        }
    }
}

impl fmt::Display for WorkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author_id, self.title_id)
    }
}

/// One catalog item as found on a listing page.
///
/// Created by discovery with an empty `archive_url`, filled in once by
/// [`WorkDescriptor::apply_detail`], then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDescriptor {
    /// Stable author identifier (e.g. `000879`)
    pub author_id: String,

    /// Stable title identifier, unique per author
    pub title_id: String,

    /// Author display name (empty until resolved)
    pub author_name: String,

    /// Work display title
    pub title: String,

    /// Canonical detail page location
    pub detail_url: String,

    /// Absolute archive location (empty until resolved)
    pub archive_url: String,
}

impl WorkDescriptor {
    /// Create a freshly discovered descriptor.
    pub fn discovered(
        author_id: impl Into<String>,
        title_id: impl Into<String>,
        title: impl Into<String>,
        detail_url: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            title_id: title_id.into(),
            author_name: String::new(),
            title: title.into(),
            detail_url: detail_url.into(),
            archive_url: String::new(),
        }
    }

    pub fn key(&self) -> WorkKey {
        WorkKey::new(&self.author_id, &self.title_id)
    }

    /// Fill in what the detail page revealed.
    ///
    /// The listing title wins over the detail page title when both exist.
    pub fn apply_detail(&mut self, detail: DetailInfo) {
        self.author_name = detail.author_name;
        if self.title.is_empty() {
            self.title = detail.title;
        }
        self.archive_url = detail.archive_url.unwrap_or_default();
    }

    /// Whether a downloadable archive is known.
    pub fn has_archive(&self) -> bool {
        !self.archive_url.is_empty()
    }
}

/// What a detail page tells about a work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    /// Author display name; empty when the metadata table is missing
    pub author_name: String,

    /// Title from the title table; empty when missing
    pub title: String,

    /// Absolute archive location, if any download link matched
    pub archive_url: Option<String>,
}

/// Stored form of one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub author_id: String,
    pub author_name: String,
}

/// Stored form of one work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub author_id: String,
    pub title_id: String,
    pub title: String,
    pub content: String,
}

/// One row returned by a full-text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub author_name: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkDescriptor {
        WorkDescriptor::discovered(
            "000879",
            "127",
            "",
            "https://www.aozora.gr.jp/cards/000879/card127.html",
        )
    }

    #[test]
    fn test_apply_detail_fills_fields() {
        let mut work = sample();
        assert!(!work.has_archive());

        work.apply_detail(DetailInfo {
            author_name: "芥川 竜之介".into(),
            title: "羅生門".into(),
            archive_url: Some(
                "https://www.aozora.gr.jp/cards/000879/files/127_ruby_150.zip".into(),
            ),
        });

        assert_eq!(work.author_name, "芥川 竜之介");
        assert_eq!(work.title, "羅生門");
        assert!(work.has_archive());
    }

    #[test]
    fn test_apply_detail_keeps_listing_title() {
        let mut work = sample();
        work.title = "羅生門".into();
        work.apply_detail(DetailInfo {
            author_name: String::new(),
            title: "別の題".into(),
            archive_url: None,
        });
        assert_eq!(work.title, "羅生門");
        assert!(!work.has_archive());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(sample().key().to_string(), "000879/127");
    }
}
