//! Utility functions and helpers.

pub mod http;
pub mod markup;
pub mod report;
pub mod url;

pub use http::{Fetcher, HttpFetcher};
pub use markup::Page;
