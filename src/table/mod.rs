//! Table - the engine's entry point.
//!
//! A [`Table`] owns the [`Pager`] for one database file and the B-tree
//! rooted at page 0. Everything a caller needs goes through it:
//! - [`Table::open`] / [`Table::close`]
//! - [`Table::insert`]
//! - [`Table::find`] and [`Table::select_all`]

pub mod row;

pub use row::{Row, RowSchema};

use std::path::Path;

use log::{debug, info, warn};

use crate::common::config::TableConfig;
use crate::common::{Error, PageId, Result};
use crate::index::btree::{BTree, Cursor, NodeLayout};
use crate::storage::{Pager, PagerStats};

/// A single table of [`Row`]s keyed by `id`, stored in one file.
///
/// Changes live in memory until [`close`](Table::close) writes every
/// loaded page back. Dropping a table without closing it loses them.
///
/// # Example
/// ```no_run
/// use pagedb::{Row, Table};
///
/// let mut table = Table::open("users.db")?;
/// table.insert(&Row::new(1, "alice", "alice@example.com"))?;
///
/// for row in table.select_all()? {
///     println!("{}", row);
/// }
/// table.close()?;
/// # Ok::<(), pagedb::Error>(())
/// ```
pub struct Table {
    pager: Pager,
    root_page: PageId,
    layout: NodeLayout,
    schema: RowSchema,
}

impl Table {
    /// Open (or create) a table with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, TableConfig::default())
    }

    /// Open (or create) a table.
    ///
    /// A new file gets an empty root leaf on page 0. An existing file must
    /// already hold a root node there.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if a row doesn't fit in a page, the internal
    ///   key cap is zero or `max_pages` is zero; the file isn't touched
    /// - `Error::Io` if the file can't be opened or read
    /// - `Error::CorruptFile` on a partial page, a missing root, or a root
    ///   holding more cells than this schema's layout allows
    /// - `Error::ChecksumMismatch` if the root page is damaged
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: TableConfig) -> Result<Self> {
        if config.max_pages == 0 {
            return Err(Error::InvalidConfig("max_pages must be at least 1".to_string()));
        }
        let layout = NodeLayout::new(config.schema.row_size(), config.internal_max_keys)?;
        let pager = Pager::open(path.as_ref(), config.max_pages)?;

        let mut table = Self {
            pager,
            root_page: PageId::ROOT,
            layout,
            schema: config.schema,
        };

        if table.pager.num_pages() == 0 {
            table.tree().initialize_root()?;
            debug!("initialized empty root leaf in {}", table.root_page);
        } else {
            table.tree().validate_root()?;
        }

        info!(
            "opened table {} ({} pages, {} rows per leaf)",
            path.as_ref().display(),
            table.pager.num_pages(),
            table.layout.leaf_max_cells
        );
        Ok(table)
    }

    fn tree(&mut self) -> BTree<'_> {
        BTree::new(&mut self.pager, &self.layout, self.root_page)
    }

    /// Insert a row keyed by its `id`.
    ///
    /// # Errors
    /// - `Error::FieldTooLong` if a field is wider than its column
    /// - `Error::DuplicateKey` if a row with this `id` exists
    /// - `Error::TableFull` if the page limit is reached
    /// - `Error::SplitPropagationUnimplemented` if the insert would split
    ///   a full internal node
    ///
    /// The table is unchanged after any of these.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        if let Err(e) = self.schema.validate(row) {
            warn!("rejected row {}: {}", row.id, e);
            return Err(e);
        }

        let value = self.schema.encode(row);
        self.tree().find(row.id)?.insert(row.id, &value)?;
        debug!("inserted row {}", row.id);
        Ok(())
    }

    /// Look up the row with the given `id`.
    pub fn find(&mut self, id: u32) -> Result<Option<Row>> {
        let schema = self.schema;
        let mut cursor = self.tree().find(id)?;

        if !cursor.has_cell()? || cursor.key()? != id {
            return Ok(None);
        }
        Ok(Some(schema.decode(cursor.value()?)))
    }

    /// Every row in ascending `id` order.
    pub fn select_all(&mut self) -> Result<Vec<Row>> {
        let schema = self.schema;
        let mut cursor = self.start()?;
        let mut rows = Vec::new();

        while !cursor.is_end() {
            rows.push(schema.decode(cursor.value()?));
            cursor.advance()?;
        }
        Ok(rows)
    }

    /// Cursor at the first row.
    pub fn start(&mut self) -> Result<Cursor<'_>> {
        self.tree().start()
    }

    /// Cursor at the row with `id`, or where it would be inserted.
    pub fn find_cursor(&mut self, id: u32) -> Result<Cursor<'_>> {
        self.tree().find(id)
    }

    /// Indented dump of the B-tree structure.
    pub fn describe_tree(&mut self) -> Result<String> {
        self.tree().dump()
    }

    #[inline]
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    #[inline]
    pub fn schema(&self) -> RowSchema {
        self.schema
    }

    #[inline]
    pub fn num_pages(&self) -> u32 {
        self.pager.num_pages()
    }

    #[inline]
    pub fn stats(&self) -> PagerStats {
        self.pager.stats()
    }

    /// Write every loaded page back and close the file.
    pub fn close(self) -> Result<()> {
        self.pager.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn user(id: u32) -> Row {
        Row::new(id, format!("user{}", id), format!("person{}@example.com", id))
    }

    #[test]
    fn test_new_table_is_empty() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db")).unwrap();

        assert_eq!(table.num_pages(), 1);
        assert!(table.select_all().unwrap().is_empty());
        assert_eq!(table.find(1).unwrap(), None);
    }

    #[test]
    fn test_insert_and_find() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db")).unwrap();
        for id in [5, 1, 3] {
            table.insert(&user(id)).unwrap();
        }

        assert_eq!(table.find(3).unwrap(), Some(user(3)));
        assert_eq!(table.find(2).unwrap(), None);
        assert_eq!(table.find(9).unwrap(), None);
        assert_eq!(
            table.select_all().unwrap(),
            vec![user(1), user(3), user(5)]
        );
    }

    #[test]
    fn test_field_too_long_is_rejected() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db")).unwrap();

        let row = Row::new(1, "a".repeat(33), "e");
        assert!(matches!(
            table.insert(&row),
            Err(Error::FieldTooLong { field: "username", .. })
        ));
        assert!(table.select_all().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_validates_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        // A well-formed page that holds no node
        let mut page = crate::storage::page::Page::new();
        page.update_checksum();
        std::fs::write(&path, page.as_slice()).unwrap();
        assert!(matches!(Table::open(&path), Err(Error::CorruptFile(_))));

        std::fs::write(&path, vec![0xABu8; crate::PAGE_SIZE]).unwrap();
        assert!(matches!(Table::open(&path), Err(Error::ChecksumMismatch(0))));
    }

    #[test]
    fn test_custom_schema() {
        let dir = tempdir().unwrap();
        let config = TableConfig::default().with_schema(RowSchema::new(4, 8));
        let mut table = Table::open_with_config(dir.path().join("t.db"), config).unwrap();

        assert_eq!(table.layout().value_size, 16);
        table.insert(&Row::new(1, "abcd", "12345678")).unwrap();
        assert!(table.insert(&Row::new(2, "abcde", "")).is_err());
        assert_eq!(table.select_all().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");

        let configs = [
            TableConfig::default().with_schema(RowSchema::new(5000, 1)),
            TableConfig::default().with_internal_max_keys(0),
            TableConfig::default().with_max_pages(0),
        ];
        for config in configs {
            assert!(matches!(
                Table::open_with_config(&path, config),
                Err(Error::InvalidConfig(_))
            ));
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_nul_in_field_is_rejected() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db")).unwrap();

        assert!(matches!(
            table.insert(&Row::new(1, "ab\0", "e")),
            Err(Error::FieldContainsNul { field: "username" })
        ));
        assert!(table.select_all().unwrap().is_empty());
    }

    #[test]
    fn test_find_cursor_positions() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db")).unwrap();
        table.insert(&user(10)).unwrap();
        table.insert(&user(20)).unwrap();

        let mut cursor = table.find_cursor(15).unwrap();
        assert_eq!(cursor.cell(), 1);
        assert_eq!(cursor.key().unwrap(), 20);
        drop(cursor);

        let mut cursor = table.find_cursor(25).unwrap();
        assert!(!cursor.has_cell().unwrap());
    }

    #[test]
    fn test_describe_tree() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("t.db")).unwrap();
        table.insert(&user(1)).unwrap();

        assert_eq!(table.describe_tree().unwrap(), "- leaf (size 1)\n  - 1\n");
    }
}
