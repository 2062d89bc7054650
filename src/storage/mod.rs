//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`Pager`] - Page cache over the database file
//! - [`PagerStats`] - Cache and I/O counters
//! - [`page`] - Page buffer and common node header

pub mod page;
mod pager;
mod stats;

pub use pager::Pager;
pub use stats::PagerStats;
