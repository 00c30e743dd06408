// src/lib.rs

//! Aozora Bunko collector library.
//!
//! Crawls an author's listing page, downloads each work's text archive,
//! segments the text and keeps it in a SQLite full-text index.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
