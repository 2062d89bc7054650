//! pagedb - a single-table store on a paged B-tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           pagedb                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │              Table (table/)                           │  │
//! │  │      open → insert / find / select_all → close        │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │                            ↓                                │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │              B-tree (index/btree/)                    │  │
//! │  │   NodeLayout + Leaf/Internal views + BTree + Cursor   │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │                            ↓                                │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │              Storage (storage/)                       │  │
//! │  │        Pager + Page + PageHeader (CRC32)              │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, config)
//! - [`error`] - Error type
//! - [`storage`] - Pager and page formats
//! - [`index`] - The B-tree
//! - [`table`] - Rows and the table facade
//!
//! # Quick Start
//! ```no_run
//! use pagedb::{Row, Table};
//!
//! let mut table = Table::open("my_database.db")?;
//! table.insert(&Row::new(1, "alice", "alice@example.com"))?;
//! assert_eq!(table.find(1)?.map(|row| row.username), Some("alice".to_string()));
//! table.close()?;
//! # Ok::<(), pagedb::Error>(())
//! ```

pub mod common;
pub mod error;
pub mod index;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::config::{TableConfig, PAGE_SIZE};
pub use common::{Error, PageId, Result};

pub use index::btree::{Cursor, NodeLayout};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{Pager, PagerStats};
pub use table::{Row, RowSchema, Table};
