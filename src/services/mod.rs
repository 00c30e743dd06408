//! Service layer for the collector.
//!
//! - Work discovery from listing pages (`EntryDiscoverer`)
//! - Detail page resolution (`DetailResolver`)
//! - Archive download and decoding (`ArchiveExtractor`)
//! - Text segmentation (`Segmenter`)

mod archive;
mod detail;
mod discovery;
mod segmenter;

pub use archive::{ArchiveExtractor, decode_shift_jis, extract_text};
pub use detail::{DetailResolver, parse_detail};
pub use discovery::{EntryDiscoverer, parse_listing};
pub use segmenter::{LinderaSegmenter, Segmenter};
