//! SQLite-backed [`WorkStore`] implementation.
//!
//! Full-text search uses an FTS5 virtual table whose `rowid` is the
//! `rowid` of the matching `contents` row. Content upserts go through
//! `ON CONFLICT .. DO UPDATE` so an existing key keeps its rowid, and the
//! full-text row is replaced in place instead of being orphaned.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};

use crate::error::Result;
use crate::models::{AuthorRecord, ContentRecord, SearchHit};
use crate::storage::{StoreCounts, WorkStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        author_id TEXT NOT NULL PRIMARY KEY,
        author TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contents (
        author_id TEXT NOT NULL,
        title_id TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        PRIMARY KEY (author_id, title_id)
    )
    "#,
    "CREATE VIRTUAL TABLE IF NOT EXISTS contents_fts USING fts5(words)",
];

/// SQLite work index.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        log::debug!("Opened index store at {}", path.display());
        Ok(store)
    }

    /// Create the relations if they do not exist. Safe to run repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Release all connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn upsert_author_on(conn: &mut SqliteConnection, author_id: &str, name: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO authors (author_id, author) VALUES (?, ?)
        ON CONFLICT(author_id) DO UPDATE SET author = excluded.author
        "#,
    )
    .bind(author_id)
    .bind(name)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_content_on(conn: &mut SqliteConnection, record: &ContentRecord) -> Result<i64> {
    let doc_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO contents (author_id, title_id, title, content) VALUES (?, ?, ?, ?)
        ON CONFLICT(author_id, title_id) DO UPDATE SET
            title = excluded.title,
            content = excluded.content
        RETURNING rowid
        "#,
    )
    .bind(&record.author_id)
    .bind(&record.title_id)
    .bind(&record.title)
    .bind(&record.content)
    .fetch_one(&mut *conn)
    .await?;
    Ok(doc_id)
}

async fn replace_index_on(conn: &mut SqliteConnection, doc_id: i64, words: &str) -> Result<()> {
    sqlx::query("DELETE FROM contents_fts WHERE rowid = ?")
        .bind(doc_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("INSERT INTO contents_fts (rowid, words) VALUES (?, ?)")
        .bind(doc_id)
        .bind(words)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[async_trait]
impl WorkStore for SqliteStore {
    async fn upsert_author(&self, author_id: &str, name: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_author_on(&mut conn, author_id, name).await
    }

    async fn upsert_content(&self, record: &ContentRecord) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        upsert_content_on(&mut conn, record).await
    }

    async fn upsert_index_entry(&self, doc_id: i64, joined_tokens: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        replace_index_on(&mut tx, doc_id, joined_tokens).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn store_work(
        &self,
        author: &AuthorRecord,
        record: &ContentRecord,
        joined_tokens: &str,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        upsert_author_on(&mut tx, &author.author_id, &author.author_name).await?;
        let doc_id = upsert_content_on(&mut tx, record).await?;
        replace_index_on(&mut tx, doc_id, joined_tokens).await?;
        tx.commit().await?;
        Ok(doc_id)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT a.author, c.title
            FROM contents_fts
            INNER JOIN contents c ON c.rowid = contents_fts.rowid
            INNER JOIN authors a ON a.author_id = c.author_id
            WHERE contents_fts MATCH ?
            ORDER BY c.author_id, c.title_id
            "#,
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(author_name, title)| SearchHit { author_name, title })
            .collect())
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let authors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        let contents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contents")
            .fetch_one(&self.pool)
            .await?;
        let index_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contents_fts")
            .fetch_one(&self.pool)
            .await?;
        Ok(StoreCounts {
            authors,
            contents,
            index_rows,
        })
    }
}
