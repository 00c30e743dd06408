//! Per-entry outcomes and run statistics.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Pipeline stage an entry is in, or failed to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Resolved,
    Extracted,
    Tokenized,
    Stored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovered => "discovered",
            Stage::Resolved => "resolved",
            Stage::Extracted => "extracted",
            Stage::Tokenized => "tokenized",
            Stage::Stored => "stored",
        };
        f.write_str(name)
    }
}

/// Why an entry was dropped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Detail page lists no downloadable archive
    NoArchive,
    /// A later listing entry has the same key
    Superseded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoArchive => f.write_str("no downloadable archive"),
            SkipReason::Superseded => f.write_str("superseded by a later listing entry"),
        }
    }
}

/// Terminal state of one entry.
#[derive(Debug)]
pub enum EntryOutcome {
    Stored { doc_id: i64 },
    Skipped(SkipReason),
    Failed { stage: Stage, error: AppError },
}

/// Summary of a collection run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub discovered: usize,
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, discovered: usize) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            discovered,
            stored: 0,
            skipped: 0,
            failed: 0,
        }
    }

    /// Count a terminal outcome.
    pub fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Stored { .. } => self.stored += 1,
            EntryOutcome::Skipped(_) => self.skipped += 1,
            EntryOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
