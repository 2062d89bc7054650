//! Typed views over the bytes of a node page.
//!
//! [`LeafNode`] and [`InternalNode`] wrap any byte buffer (`&Page`,
//! `&mut Page`, ...) together with a [`NodeLayout`]. Getters need only
//! `AsRef<[u8]>`; setters additionally need `AsMut<[u8]>`.

use crate::common::PageId;
use crate::index::btree::NodeLayout;
use crate::storage::page::{read_u32, write_u32, PageHeader, PageType};

/// Kind of node stored in `buf`.
#[inline]
pub fn node_type(buf: &[u8]) -> PageType {
    PageType::from_u8(buf[PageHeader::OFFSET_PAGE_TYPE])
}

macro_rules! common_header_accessors {
    () => {
        /// Whether this node is the table root.
        #[inline]
        pub fn is_root(&self) -> bool {
            self.buf.as_ref()[PageHeader::OFFSET_IS_ROOT] != 0
        }

        /// Parent pointer as last written.
        #[inline]
        pub fn parent(&self) -> PageId {
            PageId(read_u32(self.buf.as_ref(), PageHeader::OFFSET_PARENT))
        }
    };
}

macro_rules! common_header_setters {
    () => {
        #[inline]
        pub fn set_root(&mut self, is_root: bool) {
            self.buf.as_mut()[PageHeader::OFFSET_IS_ROOT] = is_root as u8;
        }

        #[inline]
        pub fn set_parent(&mut self, parent: PageId) {
            write_u32(self.buf.as_mut(), PageHeader::OFFSET_PARENT, parent.0);
        }
    };
}

/// A leaf node: sorted `(key, row)` cells.
pub struct LeafNode<B> {
    buf: B,
    layout: NodeLayout,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    pub fn new(buf: B, layout: &NodeLayout) -> Self {
        Self {
            buf,
            layout: *layout,
        }
    }

    common_header_accessors!();

    #[inline]
    pub fn num_cells(&self) -> usize {
        read_u32(self.buf.as_ref(), self.layout.leaf_num_cells_offset) as usize
    }

    #[inline]
    pub fn key(&self, cell: usize) -> u32 {
        read_u32(self.buf.as_ref(), self.layout.leaf_cell_offset(cell))
    }

    /// The whole cell: key followed by the row.
    pub fn cell(&self, cell: usize) -> &[u8] {
        let start = self.layout.leaf_cell_offset(cell);
        &self.buf.as_ref()[start..start + self.layout.leaf_cell_size]
    }

    pub fn value(&self, cell: usize) -> &[u8] {
        let start = self.layout.leaf_value_offset(cell);
        &self.buf.as_ref()[start..start + self.layout.value_size]
    }

    /// Largest key in the leaf, or `None` when it is empty.
    pub fn max_key(&self) -> Option<u32> {
        self.num_cells().checked_sub(1).map(|last| self.key(last))
    }

    /// Index of the cell holding `key`, or of the first cell with a larger
    /// key (the insertion point).
    pub fn find(&self, key: u32) -> usize {
        let mut min = 0;
        let mut one_past_max = self.num_cells();
        while min != one_past_max {
            let mid = min + (one_past_max - min) / 2;
            let key_at_mid = self.key(mid);
            if key == key_at_mid {
                return mid;
            }
            if key < key_at_mid {
                one_past_max = mid;
            } else {
                min = mid + 1;
            }
        }
        min
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    /// Turn the page into an empty, non-root leaf.
    pub fn initialize(&mut self) {
        PageHeader::new(PageType::BTreeLeaf).write_to(self.buf.as_mut());
        self.set_num_cells(0);
    }

    common_header_setters!();

    #[inline]
    pub fn set_num_cells(&mut self, num_cells: usize) {
        let offset = self.layout.leaf_num_cells_offset;
        write_u32(self.buf.as_mut(), offset, num_cells as u32);
    }

    pub fn cell_mut(&mut self, cell: usize) -> &mut [u8] {
        let start = self.layout.leaf_cell_offset(cell);
        &mut self.buf.as_mut()[start..start + self.layout.leaf_cell_size]
    }

    /// Write `key` and `value` into slot `cell` without touching the count.
    pub fn write_cell(&mut self, cell: usize, key: u32, value: &[u8]) {
        let slot = self.cell_mut(cell);
        slot[..4].copy_from_slice(&key.to_le_bytes());
        slot[4..].copy_from_slice(value);
    }

    /// Insert a cell at `cell`, shifting later cells one slot right.
    ///
    /// # Panics
    /// Panics if the leaf is full.
    pub fn insert_cell(&mut self, cell: usize, key: u32, value: &[u8]) {
        let num_cells = self.num_cells();
        assert!(num_cells < self.layout.leaf_max_cells, "leaf node is full");

        if cell < num_cells {
            let start = self.layout.leaf_cell_offset(cell);
            let end = self.layout.leaf_cell_offset(num_cells);
            let dest = self.layout.leaf_cell_offset(cell + 1);
            self.buf.as_mut().copy_within(start..end, dest);
        }

        self.write_cell(cell, key, value);
        self.set_num_cells(num_cells + 1);
    }
}

/// An internal node: sorted `(child, key)` cells plus a right child.
///
/// `child(i)` holds keys `<= key(i)`; the right child holds keys greater
/// than the last key.
pub struct InternalNode<B> {
    buf: B,
    layout: NodeLayout,
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    pub fn new(buf: B, layout: &NodeLayout) -> Self {
        Self {
            buf,
            layout: *layout,
        }
    }

    common_header_accessors!();

    #[inline]
    pub fn num_keys(&self) -> usize {
        read_u32(self.buf.as_ref(), self.layout.internal_num_keys_offset) as usize
    }

    #[inline]
    pub fn right_child(&self) -> PageId {
        PageId(read_u32(self.buf.as_ref(), self.layout.internal_right_child_offset))
    }

    #[inline]
    pub fn key(&self, cell: usize) -> u32 {
        read_u32(self.buf.as_ref(), self.layout.internal_key_offset(cell))
    }

    /// Child pointer `index`; `index == num_keys` is the right child.
    ///
    /// # Panics
    /// Panics if `index > num_keys`.
    pub fn child(&self, index: usize) -> PageId {
        let num_keys = self.num_keys();
        assert!(
            index <= num_keys,
            "child index {} out of range for {} keys",
            index,
            num_keys
        );
        if index == num_keys {
            self.right_child()
        } else {
            PageId(read_u32(self.buf.as_ref(), self.layout.internal_cell_offset(index)))
        }
    }

    /// Every child pointer in order, right child last.
    pub fn children(&self) -> Vec<PageId> {
        (0..=self.num_keys()).map(|i| self.child(i)).collect()
    }

    /// Index of the child whose subtree may hold `key`: the first key
    /// `>= key`, or `num_keys` for the right child.
    pub fn find_child_index(&self, key: u32) -> usize {
        let mut min = 0;
        let mut max = self.num_keys();
        while min != max {
            let mid = min + (max - min) / 2;
            if self.key(mid) >= key {
                max = mid;
            } else {
                min = mid + 1;
            }
        }
        min
    }

    pub fn is_full(&self) -> bool {
        self.num_keys() >= self.layout.internal_max_keys
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    /// Turn the page into an empty, non-root internal node.
    pub fn initialize(&mut self) {
        PageHeader::new(PageType::BTreeInternal).write_to(self.buf.as_mut());
        self.set_num_keys(0);
        self.set_right_child(PageId::INVALID);
    }

    common_header_setters!();

    #[inline]
    pub fn set_num_keys(&mut self, num_keys: usize) {
        let offset = self.layout.internal_num_keys_offset;
        write_u32(self.buf.as_mut(), offset, num_keys as u32);
    }

    #[inline]
    pub fn set_right_child(&mut self, child: PageId) {
        let offset = self.layout.internal_right_child_offset;
        write_u32(self.buf.as_mut(), offset, child.0);
    }

    #[inline]
    pub fn set_key(&mut self, cell: usize, key: u32) {
        let offset = self.layout.internal_key_offset(cell);
        write_u32(self.buf.as_mut(), offset, key);
    }

    /// Set the child pointer of cell `cell` (not the right child).
    #[inline]
    pub fn set_child(&mut self, cell: usize, child: PageId) {
        let offset = self.layout.internal_cell_offset(cell);
        write_u32(self.buf.as_mut(), offset, child.0);
    }

    /// Insert `(child, key)` at `cell`, shifting later cells one slot right.
    ///
    /// # Panics
    /// Panics if the node is full.
    pub fn insert_cell(&mut self, cell: usize, child: PageId, key: u32) {
        let num_keys = self.num_keys();
        assert!(num_keys < self.layout.internal_max_keys, "internal node is full");

        if cell < num_keys {
            let start = self.layout.internal_cell_offset(cell);
            let end = self.layout.internal_cell_offset(num_keys);
            let dest = self.layout.internal_cell_offset(cell + 1);
            self.buf.as_mut().copy_within(start..end, dest);
        }

        self.set_child(cell, child);
        self.set_key(cell, key);
        self.set_num_keys(num_keys + 1);
    }
}
