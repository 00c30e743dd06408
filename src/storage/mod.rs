//! Storage abstractions for the work index.
//!
//! Three relations back the index:
//!
//! ```text
//! authors(author_id PK, author)
//! contents(author_id, title_id, title, content, PK(author_id, title_id))
//! contents_fts(rowid = contents.rowid, words)   -- FTS5 over segmented text
//! ```
//!
//! Every content row has exactly one full-text row keyed by the content
//! row's identity, and the two are always replaced together.

pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AuthorRecord, ContentRecord, SearchHit};

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Row counts of the three relations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub authors: i64,
    pub contents: i64,
    pub index_rows: i64,
}

/// Trait for work index backends.
#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Insert or replace an author row.
    async fn upsert_author(&self, author_id: &str, name: &str) -> Result<()>;

    /// Insert or replace a content row and return its stable document id.
    ///
    /// Replacing an existing key keeps its document id.
    async fn upsert_content(&self, record: &ContentRecord) -> Result<i64>;

    /// Insert or replace the full-text row for `doc_id`.
    async fn upsert_index_entry(&self, doc_id: i64, joined_tokens: &str) -> Result<()>;

    /// Persist author, content and index row in one transaction.
    async fn store_work(
        &self,
        author: &AuthorRecord,
        record: &ContentRecord,
        joined_tokens: &str,
    ) -> Result<i64>;

    /// Run a boolean full-text query, one hit per matching document.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Current row counts.
    async fn counts(&self) -> Result<StoreCounts>;
}
