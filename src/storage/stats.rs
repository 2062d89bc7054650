//! Pager statistics tracking.

use std::fmt;

/// Counters kept by the [`Pager`](super::Pager).
///
/// The pager is single-threaded, so these are plain integers; reading them
/// through [`Pager::stats`](super::Pager::stats) returns a copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PagerStats {
    /// Number of `get_page` calls served from memory.
    pub cache_hits: u64,

    /// Number of `get_page` calls that had to materialize the page.
    pub cache_misses: u64,

    /// Number of pages read from disk.
    pub pages_read: u64,

    /// Number of pages written to disk.
    pub pages_written: u64,
}

impl PagerStats {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for PagerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} hit_rate={:.2}% read={} written={}",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate() * 100.0,
            self.pages_read,
            self.pages_written,
        )
    }
}
