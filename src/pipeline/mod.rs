//! Pipeline entry points.
//!
//! - `Collector`: discover, resolve, extract, segment and store every work on a listing page

pub mod collect;

pub use collect::Collector;
