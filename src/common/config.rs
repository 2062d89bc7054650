//! Configuration for pagedb.
//!
//! Compile-time constants live here alongside [`TableConfig`], the runtime
//! knobs handed to [`Table::open_with_config`](crate::Table::open_with_config).

use crate::table::RowSchema;

/// Size of a page in bytes (4KB).
///
/// One page holds exactly one B-tree node and is the unit of I/O. It matches
/// the OS page size on most systems, so the kernel moves our pages in and
/// out of memory as whole units.
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages a table may hold.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Width of the `username` column in bytes.
pub const COLUMN_USERNAME_SIZE: usize = 32;

/// Width of the `email` column in bytes.
pub const COLUMN_EMAIL_SIZE: usize = 255;

/// Runtime configuration for a table.
///
/// # Example
/// ```
/// use pagedb::TableConfig;
///
/// let config = TableConfig::default().with_max_pages(16);
/// assert_eq!(config.max_pages, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Upper bound on the number of pages; inserts needing more are
    /// rejected with `TableFull`.
    pub max_pages: u32,

    /// Field widths of the stored rows.
    pub schema: RowSchema,

    /// Optional cap on keys per internal node.
    ///
    /// `None` uses everything that fits in a page.
    pub internal_max_keys: Option<usize>,
}

impl TableConfig {
    /// Set the page limit.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the row schema.
    pub fn with_schema(mut self, schema: RowSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Cap the number of keys an internal node holds.
    pub fn with_internal_max_keys(mut self, max_keys: usize) -> Self {
        self.internal_max_keys = Some(max_keys);
        self
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            schema: RowSchema::default(),
            internal_max_keys: None,
        }
    }
}
