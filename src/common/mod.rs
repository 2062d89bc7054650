//! Common types and utilities shared across pagedb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`TableConfig`](config::TableConfig)
//! - Error types (re-exported from [`crate::error`])
//! - Page identifiers

pub mod config;
mod page_id;

pub use crate::error::{Error, Result};
pub use page_id::PageId;
