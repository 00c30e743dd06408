// src/models/mod.rs

//! Domain models for the collector.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod outcome;
mod work;

// Re-export all public types
pub use config::{CatalogConfig, Config, CrawlerConfig, LinkPolicy, StoreConfig};
pub use outcome::{EntryOutcome, RunSummary, SkipReason, Stage};
pub use work::{AuthorRecord, ContentRecord, DetailInfo, SearchHit, WorkDescriptor, WorkKey};
