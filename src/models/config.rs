//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Catalog locations and archive matching rules
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Index database settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if url::Url::parse(&self.catalog.listing_url).is_err() {
            return Err(AppError::validation(format!(
                "catalog.listing_url is not an absolute URL: {}",
                self.catalog.listing_url
            )));
        }
        if url::Url::parse(&self.catalog.site_base).is_err() {
            return Err(AppError::validation(format!(
                "catalog.site_base is not an absolute URL: {}",
                self.catalog.site_base
            )));
        }
        if !self.catalog.archive_extension.starts_with('.') {
            return Err(AppError::validation(
                "catalog.archive_extension must start with '.'",
            ));
        }
        if !self.catalog.text_extension.starts_with('.') {
            return Err(AppError::validation(
                "catalog.text_extension must start with '.'",
            ));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(AppError::validation("store.path is empty"));
        }
        if self.store.max_connections == 0 {
            return Err(AppError::validation("store.max_connections must be > 0"));
        }
        if self.store.max_consecutive_failures == 0 {
            return Err(AppError::validation(
                "store.max_consecutive_failures must be > 0",
            ));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay after each finished entry in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum entries processed at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Extra attempts for a retryable fetch failure
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base backoff between attempts in milliseconds (grows linearly)
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

/// Which download link wins when a detail page lists several archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    First,
    #[default]
    Last,
}

/// Catalog locations and matching rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Listing page enumerating works
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Site root used to build canonical detail page URLs
    #[serde(default = "defaults::site_base")]
    pub site_base: String,

    /// Suffix of downloadable archive links
    #[serde(default = "defaults::archive_extension")]
    pub archive_extension: String,

    /// Extension of the text payload inside an archive (case-sensitive)
    #[serde(default = "defaults::text_extension")]
    pub text_extension: String,

    /// Download link selection when several match
    #[serde(default)]
    pub link_policy: LinkPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::listing_url(),
            site_base: defaults::site_base(),
            archive_extension: defaults::archive_extension(),
            text_extension: defaults::text_extension(),
            link_policy: LinkPolicy::default(),
        }
    }
}

/// Index database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,

    /// Pool size
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,

    /// Store failures in a row that abort the run
    #[serde(default = "defaults::max_consecutive_failures")]
    pub max_consecutive_failures: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
            max_connections: defaults::max_connections(),
            max_consecutive_failures: defaults::max_consecutive_failures(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; aozora-collector/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn retry_backoff() -> u64 {
        500
    }

    // Catalog defaults
    pub fn listing_url() -> String {
        "https://www.aozora.gr.jp/index_pages/person879.html".into()
    }
    pub fn site_base() -> String {
        "https://www.aozora.gr.jp".into()
    }
    pub fn archive_extension() -> String {
        ".zip".into()
    }
    pub fn text_extension() -> String {
        ".txt".into()
    }

    // Store defaults
    pub fn store_path() -> PathBuf {
        PathBuf::from("database.sqlite")
    }
    pub fn max_connections() -> u32 {
        4
    }
    pub fn max_consecutive_failures() -> usize {
        3
    }
}
