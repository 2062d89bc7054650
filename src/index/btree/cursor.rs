//! Cursor - a (page, cell) position in the leaf level.

use crate::common::{PageId, Result};
use crate::index::btree::node::{InternalNode, LeafNode};
use crate::index::btree::tree::{Ancestor, BTree};

/// A position in the tree, used both for ordered scans and as the target
/// of an insert.
///
/// The cursor remembers the internal nodes it descended through, so when
/// a leaf is exhausted it can climb to the nearest ancestor with an
/// unvisited child and continue from that child's leftmost leaf.
///
/// # Example
/// ```no_run
/// use pagedb::Table;
///
/// let mut table = Table::open("users.db")?;
/// let mut cursor = table.start()?;
/// while !cursor.is_end() {
///     println!("{}", cursor.key()?);
///     cursor.advance()?;
/// }
/// # Ok::<(), pagedb::Error>(())
/// ```
pub struct Cursor<'a> {
    tree: BTree<'a>,
    page: PageId,
    cell: usize,
    path: Vec<Ancestor>,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(
        tree: BTree<'a>,
        page: PageId,
        cell: usize,
        path: Vec<Ancestor>,
        end_of_table: bool,
    ) -> Self {
        Self {
            tree,
            page,
            cell,
            path,
            end_of_table,
        }
    }

    /// Leaf page the cursor points into.
    #[inline]
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Cell index within [`page`](Self::page).
    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// Whether the cursor has moved past the last row.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Whether the cursor points at an occupied cell.
    ///
    /// A cursor from [`BTree::find`] may sit one past the last cell of its
    /// leaf, where a larger key would be inserted.
    pub fn has_cell(&mut self) -> Result<bool> {
        if self.end_of_table {
            return Ok(false);
        }
        let layout = self.tree.layout;
        let leaf = LeafNode::new(self.tree.node(self.page)?, layout);
        Ok(self.cell < leaf.num_cells())
    }

    /// Key of the current cell.
    ///
    /// # Panics
    /// Panics if the cursor doesn't point at a cell.
    pub fn key(&mut self) -> Result<u32> {
        let layout = self.tree.layout;
        let leaf = LeafNode::new(self.tree.node(self.page)?, layout);
        assert!(self.cell < leaf.num_cells(), "cursor is past the last cell");
        Ok(leaf.key(self.cell))
    }

    /// Row bytes of the current cell.
    ///
    /// # Panics
    /// Panics if the cursor doesn't point at a cell.
    pub fn value(&mut self) -> Result<&[u8]> {
        let layout = self.tree.layout;
        let page = self.tree.node(self.page)?;
        let num_cells = LeafNode::new(&*page, layout).num_cells();
        assert!(self.cell < num_cells, "cursor is past the last cell");

        let start = layout.leaf_value_offset(self.cell);
        Ok(&page.as_slice()[start..start + layout.value_size])
    }

    /// Move to the next cell in key order, setting the end-of-table flag
    /// after the last one.
    pub fn advance(&mut self) -> Result<()> {
        if self.end_of_table {
            return Ok(());
        }

        let layout = self.tree.layout;
        let num_cells = LeafNode::new(self.tree.node(self.page)?, layout).num_cells();
        self.cell += 1;
        if self.cell >= num_cells {
            self.next_leaf()?;
        }
        Ok(())
    }

    /// Move to the first cell of the next non-empty leaf, or to the end.
    pub(crate) fn next_leaf(&mut self) -> Result<()> {
        let layout = self.tree.layout;
        while let Some(ancestor) = self.path.pop() {
            let node = InternalNode::new(self.tree.node(ancestor.page)?, layout);
            if ancestor.child_index >= node.num_keys() {
                continue;
            }

            let child_index = ancestor.child_index + 1;
            let child = node.child(child_index);
            self.path.push(Ancestor {
                page: ancestor.page,
                child_index,
            });

            let leaf = self.tree.leftmost_leaf(child, &mut self.path)?;
            self.page = leaf;
            self.cell = 0;

            let num_cells = LeafNode::new(self.tree.node(leaf)?, layout).num_cells();
            if num_cells > 0 {
                return Ok(());
            }
        }

        self.end_of_table = true;
        Ok(())
    }

    /// Insert `(key, value)` at the cursor's position.
    ///
    /// The cursor must come from [`BTree::find`] for the same `key`.
    ///
    /// # Errors
    /// `Error::DuplicateKey`, `Error::TableFull` or
    /// `Error::SplitPropagationUnimplemented`; the tree is unchanged after
    /// any of them.
    pub fn insert(mut self, key: u32, value: &[u8]) -> Result<()> {
        self.tree.insert_at(self.page, self.cell, &self.path, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::btree::NodeLayout;
    use crate::storage::Pager;
    use tempfile::tempdir;

    fn key_bytes(key: u32) -> [u8; 8] {
        let mut v = [0u8; 8];
        v[4..].copy_from_slice(&key.to_le_bytes());
        v
    }

    #[test]
    fn test_scan_across_leaves() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(dir.path().join("cursor.db"), 50).unwrap();
        let layout = NodeLayout::new(8, None).unwrap();
        BTree::new(&mut pager, &layout, PageId::ROOT)
            .initialize_root()
            .unwrap();

        // Descending inserts split the leftmost leaf repeatedly
        let n = layout.leaf_max_cells as u32 * 4;
        for key in (1..=n).rev() {
            BTree::new(&mut pager, &layout, PageId::ROOT)
                .find(key)
                .unwrap()
                .insert(key, &key_bytes(key))
                .unwrap();
        }
        assert!(pager.num_pages() > 3);

        let mut cursor = BTree::new(&mut pager, &layout, PageId::ROOT).start().unwrap();
        let mut seen = Vec::new();
        while !cursor.is_end() {
            let key = cursor.key().unwrap();
            assert_eq!(cursor.value().unwrap(), &key_bytes(key));
            seen.push(key);
            cursor.advance().unwrap();
        }
        assert_eq!(seen, (1..=n).collect::<Vec<_>>());

        // Advancing at the end is a no-op
        cursor.advance().unwrap();
        assert!(cursor.is_end());
    }

    #[test]
    #[should_panic(expected = "past the last cell")]
    fn test_value_on_empty_leaf_panics() {
        let dir = tempdir().unwrap();
        let mut pager = Pager::open(dir.path().join("cursor.db"), 5).unwrap();
        let layout = NodeLayout::new(8, None).unwrap();
        let mut tree = BTree::new(&mut pager, &layout, PageId::ROOT);
        tree.initialize_root().unwrap();

        let mut cursor = tree.find(1).unwrap();
        let _ = cursor.value();
    }
}
