// src/pipeline/collect.rs

//! Collection run: discovery → resolution → extraction → tokenization → storage.
//!
//! Each entry walks `Discovered → Resolved → Extracted → Tokenized → Stored`
//! and ends `Stored`, `Skipped` or `Failed`. Entry failures are caught here
//! and never stop the run. Only a failed listing fetch, or a run of store
//! failures long enough to suggest the store itself is broken, is fatal.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, ErrorKind, Result};
use crate::models::{
    AuthorRecord, Config, ContentRecord, EntryOutcome, RunSummary, SkipReason, Stage,
    WorkDescriptor,
};
use crate::services::{
    ArchiveExtractor, DetailResolver, EntryDiscoverer, LinderaSegmenter, Segmenter,
};
use crate::storage::WorkStore;
use crate::utils::{Fetcher, report};

/// Drives a full collection run over one listing page.
pub struct Collector {
    discoverer: EntryDiscoverer,
    resolver: DetailResolver,
    extractor: ArchiveExtractor,
    segmenter: Arc<dyn Segmenter>,
    store: Arc<dyn WorkStore>,
    concurrency: usize,
    delay: Duration,
    max_store_failures: usize,
}

impl Collector {
    /// Build a collector with the default Japanese segmenter.
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn WorkStore>,
    ) -> Result<Self> {
        let segmenter = Arc::new(LinderaSegmenter::new()?);
        Ok(Self::with_segmenter(config, fetcher, store, segmenter))
    }

    pub fn with_segmenter(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn WorkStore>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Self {
        let catalog = &config.catalog;
        Self {
            discoverer: EntryDiscoverer::new(Arc::clone(&fetcher), &catalog.site_base),
            resolver: DetailResolver::new(
                Arc::clone(&fetcher),
                &catalog.archive_extension,
                catalog.link_policy,
            ),
            extractor: ArchiveExtractor::new(fetcher, &catalog.text_extension),
            segmenter,
            store,
            concurrency: config.crawler.max_concurrent.max(1),
            delay: Duration::from_millis(config.crawler.request_delay_ms),
            max_store_failures: config.store.max_consecutive_failures.max(1),
        }
    }

    /// Collect every work on `listing_url` into the store.
    pub async fn run(&self, listing_url: &str) -> Result<RunSummary> {
        let started_at = Utc::now();
        report::header(&format!("Collecting works from {listing_url}"));

        let works = self.discoverer.discover(listing_url).await?;
        let mut summary = RunSummary::new(started_at, works.len());
        log::info!("Discovered {} works", works.len());

        let (jobs, superseded) = partition_superseded(works);
        for work in &superseded {
            log::debug!("{}: skipped, {}", work.key(), SkipReason::Superseded);
            summary.record(&EntryOutcome::Skipped(SkipReason::Superseded));
        }

        let mut results = stream::iter(jobs)
            .map(|work| async move {
                let key = work.key();
                (key, self.process(work).await)
            })
            .buffer_unordered(self.concurrency);

        let mut store_failures = 0usize;
        while let Some((key, outcome)) = results.next().await {
            match &outcome {
                EntryOutcome::Stored { doc_id } => {
                    store_failures = 0;
                    log::info!("{}: stored as document {}", key, doc_id);
                }
                EntryOutcome::Skipped(reason) => {
                    log::info!("{}: skipped, {}", key, reason);
                }
                EntryOutcome::Failed { stage, error } => {
                    log::warn!(
                        "{}: failed after {} ({} error): {}",
                        key,
                        stage,
                        error.kind(),
                        error
                    );
                    if error.kind() == ErrorKind::Store {
                        store_failures += 1;
                        if store_failures >= self.max_store_failures {
                            log::error!("Store looks unusable, aborting run");
                            return Err(AppError::StoreUnusable {
                                failures: store_failures,
                            });
                        }
                    }
                }
            }
            summary.record(&outcome);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        summary.finished_at = Utc::now();
        report::summary("Collection", &report::run_items(&summary));
        Ok(summary)
    }

    /// Take one entry from `Discovered` to a terminal state.
    ///
    /// A `Failed` outcome names the last stage the entry reached.
    pub async fn process(&self, mut work: WorkDescriptor) -> EntryOutcome {
        let key = work.key();

        let detail = match self.resolver.resolve(&work.detail_url).await {
            Ok(detail) => detail,
            Err(error) => return failed(Stage::Discovered, error),
        };
        work.apply_detail(detail);
        if !work.has_archive() {
            return EntryOutcome::Skipped(SkipReason::NoArchive);
        }
        log::debug!("{}: {} -> {}", key, Stage::Resolved, work.archive_url);

        let text = match self.extractor.extract(&work.archive_url).await {
            Ok(text) => text,
            Err(error) => return failed(Stage::Resolved, error),
        };
        log::debug!("{}: {} ({} chars)", key, Stage::Extracted, text.chars().count());

        let joined = match self.segmenter.segment_joined(&text) {
            Ok(joined) => joined,
            Err(error) => return failed(Stage::Extracted, error),
        };
        log::debug!("{}: {}", key, Stage::Tokenized);

        let author = AuthorRecord {
            author_id: work.author_id.clone(),
            author_name: work.author_name.clone(),
        };
        let record = ContentRecord {
            author_id: work.author_id,
            title_id: work.title_id,
            title: work.title,
            content: text,
        };
        match self.store.store_work(&author, &record, &joined).await {
            Ok(doc_id) => {
                log::debug!("{}: {}", key, Stage::Stored);
                EntryOutcome::Stored { doc_id }
            }
            Err(error) => failed(Stage::Tokenized, error),
        }
    }
}

fn failed(stage: Stage, error: AppError) -> EntryOutcome {
    EntryOutcome::Failed { stage, error }
}

/// Split works into the last occurrence of each key and earlier duplicates.
///
/// Kept works stay in listing order.
fn partition_superseded(works: Vec<WorkDescriptor>) -> (Vec<WorkDescriptor>, Vec<WorkDescriptor>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut superseded = Vec::new();

    for work in works.into_iter().rev() {
        if seen.insert(work.key()) {
            kept.push(work);
        } else {
            superseded.push(work);
        }
    }

    kept.reverse();
    superseded.reverse();
    (kept, superseded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use std::sync::LazyLock;

    use async_trait::async_trait;
    use encoding_rs::SHIFT_JIS;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    use crate::models::{SearchHit, WorkKey};
    use crate::storage::{SqliteStore, StoreCounts};

    const SITE: &str = "https://site.test";
    const LISTING_URL: &str = "https://site.test/index_pages/person1.html";

    enum Reply {
        Text(String),
        Bytes(Vec<u8>),
        Status(u16),
    }

    /// Serves canned responses; unknown URLs answer 404.
    #[derive(Default)]
    struct StaticFetcher {
        replies: HashMap<String, Reply>,
    }

    impl StaticFetcher {
        fn with(mut self, url: impl Into<String>, reply: Reply) -> Self {
            self.replies.insert(url.into(), reply);
            self
        }

        fn reply(&self, url: &str) -> Result<&Reply> {
            match self.replies.get(url) {
                Some(Reply::Status(status)) => Err(AppError::status(url, *status)),
                Some(reply) => Ok(reply),
                None => Err(AppError::status(url, 404)),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn get_text(&self, url: &str) -> Result<String> {
            match self.reply(url)? {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
                Reply::Status(_) => unreachable!(),
            }
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
            match self.reply(url)? {
                Reply::Text(text) => Ok(text.as_bytes().to_vec()),
                Reply::Bytes(bytes) => Ok(bytes.clone()),
                Reply::Status(_) => unreachable!(),
            }
        }
    }

    /// Store whose every write fails.
    struct BrokenStore;

    #[async_trait]
    impl WorkStore for BrokenStore {
        async fn upsert_author(&self, _: &str, _: &str) -> Result<()> {
            Err(AppError::Store(sqlx::Error::PoolClosed))
        }
        async fn upsert_content(&self, _: &ContentRecord) -> Result<i64> {
            Err(AppError::Store(sqlx::Error::PoolClosed))
        }
        async fn upsert_index_entry(&self, _: i64, _: &str) -> Result<()> {
            Err(AppError::Store(sqlx::Error::PoolClosed))
        }
        async fn store_work(&self, _: &AuthorRecord, _: &ContentRecord, _: &str) -> Result<i64> {
            Err(AppError::Store(sqlx::Error::PoolClosed))
        }
        async fn search(&self, _: &str) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
        async fn counts(&self) -> Result<StoreCounts> {
            Ok(StoreCounts::default())
        }
    }

    static SEGMENTER: LazyLock<Arc<LinderaSegmenter>> =
        LazyLock::new(|| Arc::new(LinderaSegmenter::new().unwrap()));

    fn collector(fetcher: Arc<dyn Fetcher>, store: Arc<dyn WorkStore>) -> Collector {
        Collector::with_segmenter(&test_config(), fetcher, store, SEGMENTER.clone())
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.catalog.site_base = SITE.to_string();
        config.catalog.listing_url = LISTING_URL.to_string();
        config.crawler.request_delay_ms = 0;
        config.crawler.max_concurrent = 2;
        config
    }

    fn listing(title_ids: &[&str]) -> String {
        let items: String = title_ids
            .iter()
            .map(|id| format!(r#"<li><a href="../cards/000001/card{id}.html">作品{id}</a></li>"#))
            .collect();
        format!(r#"<html><body><a href="../index.html">top</a><ol>{items}</ol></body></html>"#)
    }

    fn detail_url(title_id: &str) -> String {
        format!("{SITE}/cards/000001/card{title_id}.html")
    }

    fn archive_url(title_id: &str) -> String {
        format!("{SITE}/cards/000001/files/{title_id}_ruby.zip")
    }

    fn detail(title_id: &str) -> String {
        format!(
            r#"<html><body>
              <table summary="作家データ"><tr><td>作家名：</td><td>宮沢 賢治</td></tr></table>
              <table class="download"><tr><td><a href="./files/{title_id}_ruby.zip">zip</a></td></tr></table>
            </body></html>"#
        )
    }

    fn archive(text: &str) -> Vec<u8> {
        let (body, _, _) = SHIFT_JIS.encode(text);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("work.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&body).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Listing, detail page and archive for each id.
    fn site(title_ids: &[&str]) -> StaticFetcher {
        let mut fetcher =
            StaticFetcher::default().with(LISTING_URL, Reply::Text(listing(title_ids)));
        for id in title_ids {
            fetcher = fetcher
                .with(detail_url(id), Reply::Text(detail(id)))
                .with(
                    archive_url(id),
                    Reply::Bytes(archive(&format!("作品{id}の虫がココアを飲む。"))),
                );
        }
        fetcher
    }

    async fn open_store(tmp: &TempDir) -> SqliteStore {
        SqliteStore::open(tmp.path().join("index.sqlite"), 2)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_stores_every_entry() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fetcher = Arc::new(site(&["1", "2", "3"]));
        let collector = collector(fetcher, Arc::new(store.clone()));

        let summary = collector.run(LISTING_URL).await.unwrap();

        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.stored, 3);
        assert_eq!(summary.failed, 0);
        let counts = store.counts().await.unwrap();
        assert_eq!((counts.authors, counts.contents, counts.index_rows), (1, 3, 3));

        let hits = store.search("虫 AND ココア").await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].author_name, "宮沢 賢治");
    }

    #[tokio::test]
    async fn test_japanese_words_are_searchable() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fetcher = Arc::new(
            site(&["1"]).with(
                archive_url("1"),
                Reply::Bytes(archive("羅生門の下で下人が雨やみを待っていた。")),
            ),
        );
        let collector =
            Collector::new(&test_config(), fetcher, Arc::new(store.clone())).unwrap();

        let summary = collector.run(LISTING_URL).await.unwrap();
        assert_eq!(summary.stored, 1);

        assert_eq!(store.search("羅生門").await.unwrap().len(), 1);
        assert_eq!(store.search("下人").await.unwrap().len(), 1);
        let hits = store.search("羅生門 AND 下人").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "作品1");
        assert!(store.search("羅生門 AND ココア").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_isolation() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let ids = ["1", "2", "3", "4", "5"];
        let fetcher = Arc::new(site(&ids).with(archive_url("2"), Reply::Status(500)));
        let collector = collector(fetcher, Arc::new(store.clone()));

        let summary = collector.run(LISTING_URL).await.unwrap();

        assert_eq!(summary.discovered, 5);
        assert_eq!(summary.stored, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.counts().await.unwrap().contents, 4);

        let titles: Vec<String> = store
            .search("ココア")
            .await
            .unwrap()
            .into_iter()
            .map(|hit| hit.title)
            .collect();
        assert!(!titles.contains(&"作品2".to_string()));
        assert!(titles.contains(&"作品5".to_string()));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fetcher: Arc<dyn Fetcher> = Arc::new(site(&["1", "2"]));
        let collector = collector(fetcher, Arc::new(store.clone()));

        collector.run(LISTING_URL).await.unwrap();
        let first = store.counts().await.unwrap();
        collector.run(LISTING_URL).await.unwrap();
        let second = store.counts().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.contents, 2);
        assert_eq!(second.index_rows, 2);
    }

    #[tokio::test]
    async fn test_missing_archive_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let no_download = r#"<table summary="作家データ"><tr><td>作家名：</td><td>誰か</td></tr></table>"#;
        let fetcher = Arc::new(
            site(&["1", "2"]).with(detail_url("2"), Reply::Text(no_download.to_string())),
        );
        let collector = collector(fetcher, Arc::new(store.clone()));

        let summary = collector.run(LISTING_URL).await.unwrap();

        assert_eq!(summary.stored, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_detail_fetch_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fetcher = Arc::new(site(&["1", "2"]).with(detail_url("1"), Reply::Status(503)));
        let collector = collector(fetcher, Arc::new(store.clone()));

        let summary = collector.run(LISTING_URL).await.unwrap();
        assert_eq!((summary.stored, summary.failed), (1, 1));
    }

    #[tokio::test]
    async fn test_duplicate_listing_entries_superseded() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fetcher = Arc::new(site(&["1", "2", "1"]));
        let collector = collector(fetcher, Arc::new(store.clone()));

        let summary = collector.run(LISTING_URL).await.unwrap();

        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.stored, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(store.counts().await.unwrap().index_rows, 2);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let fetcher = Arc::new(StaticFetcher::default().with(LISTING_URL, Reply::Status(502)));
        let collector = collector(fetcher, Arc::new(store));

        let err = collector.run(LISTING_URL).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[tokio::test]
    async fn test_repeated_store_failures_abort() {
        let fetcher = Arc::new(site(&["1", "2", "3", "4", "5"]));
        let collector = collector(fetcher, Arc::new(BrokenStore));

        let err = collector.run(LISTING_URL).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnusable { failures: 3 }));
    }

    #[tokio::test]
    async fn test_process_reports_failed_stage() {
        let fetcher = Arc::new(site(&["1"]).with(archive_url("1"), Reply::Status(404)));
        let collector = collector(fetcher, Arc::new(BrokenStore));
        let work = WorkDescriptor::discovered("000001", "1", "作品1", detail_url("1"));

        match collector.process(work).await {
            EntryOutcome::Failed { stage, error } => {
                assert_eq!(stage, Stage::Resolved);
                assert_eq!(error.kind(), ErrorKind::Fetch);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_partition_superseded_keeps_last() {
        let works = vec![
            WorkDescriptor::discovered("1", "1", "old", "u1"),
            WorkDescriptor::discovered("1", "2", "other", "u2"),
            WorkDescriptor::discovered("1", "1", "new", "u3"),
        ];
        let (kept, superseded) = partition_superseded(works);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].key(), WorkKey::new("1", "2"));
        assert_eq!(kept[1].title, "new");
        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].title, "old");
    }
}
