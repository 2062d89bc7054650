//! Node layout - byte offsets of every node field.
//!
//! Sizes and offsets are computed once from the page size and the row
//! width, then carried around as a [`NodeLayout`] value.

use std::fmt;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::page::PageHeader;

/// Size of a key (the row id) in bytes.
const KEY_SIZE: usize = 4;

/// Size of a child page pointer in bytes.
const CHILD_POINTER_SIZE: usize = 4;

/// Size of a cell-count or key-count field in bytes.
const COUNT_SIZE: usize = 4;

/// Byte layout of leaf and internal nodes.
///
/// # Leaf node
/// ```text
/// ┌───────────────┬───────────┬──────────────────┬─────┬──────────────────┐
/// │ common header │ num_cells │ key 0 │ value 0  │ ... │ key N │ value N  │
/// │ (10 bytes)    │ (4 bytes) │ (4)   │ (row)    │     │ (4)   │ (row)    │
/// └───────────────┴───────────┴──────────────────┴─────┴──────────────────┘
/// ```
///
/// # Internal node
/// ```text
/// ┌───────────────┬──────────┬─────────────┬─────────────────┬─────┐
/// │ common header │ num_keys │ right_child │ child 0 │ key 0 │ ... │
/// │ (10 bytes)    │ (4)      │ (4)         │ (4)     │ (4)   │     │
/// └───────────────┴──────────┴─────────────┴─────────────────┴─────┘
/// ```
///
/// # Example
/// ```
/// use pagedb::index::btree::NodeLayout;
///
/// let layout = NodeLayout::new(291, None)?;
/// assert_eq!(layout.leaf_cell_size, 295);
/// assert_eq!(layout.leaf_max_cells, 13);
/// # Ok::<(), pagedb::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    /// Size of a serialized row.
    pub value_size: usize,

    pub common_header_size: usize,

    pub leaf_num_cells_offset: usize,
    pub leaf_header_size: usize,
    pub leaf_cell_size: usize,
    pub leaf_space_for_cells: usize,
    pub leaf_max_cells: usize,
    /// Cells kept in the original (left) leaf on a split.
    pub leaf_left_split_count: usize,
    /// Cells moved to the new (right) leaf on a split.
    pub leaf_right_split_count: usize,

    pub internal_num_keys_offset: usize,
    pub internal_right_child_offset: usize,
    pub internal_header_size: usize,
    pub internal_cell_size: usize,
    /// Keys that physically fit in an internal page.
    pub internal_keys_fit: usize,
    /// Keys an internal node may hold; at most `internal_keys_fit`.
    pub internal_max_keys: usize,
}

impl NodeLayout {
    /// Compute the layout for rows of `value_size` bytes.
    ///
    /// `internal_max_keys` caps the fanout below what fits in a page.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if a leaf can't hold a single cell or the cap
    /// is zero.
    pub fn new(value_size: usize, internal_max_keys: Option<usize>) -> Result<Self> {
        let common_header_size = PageHeader::SIZE;

        let leaf_num_cells_offset = common_header_size;
        let leaf_header_size = leaf_num_cells_offset + COUNT_SIZE;
        let leaf_cell_size = KEY_SIZE.saturating_add(value_size);
        let leaf_space_for_cells = PAGE_SIZE - leaf_header_size;
        let leaf_max_cells = leaf_space_for_cells / leaf_cell_size;
        if leaf_max_cells == 0 {
            return Err(Error::InvalidConfig(format!(
                "a row of {} bytes does not fit in a page",
                value_size
            )));
        }

        // The overflowing insert leaves max_cells + 1 entries; the left
        // leaf keeps the larger half.
        let leaf_right_split_count = (leaf_max_cells + 1) / 2;
        let leaf_left_split_count = leaf_max_cells + 1 - leaf_right_split_count;

        let internal_num_keys_offset = common_header_size;
        let internal_right_child_offset = internal_num_keys_offset + COUNT_SIZE;
        let internal_header_size = internal_right_child_offset + CHILD_POINTER_SIZE;
        let internal_cell_size = CHILD_POINTER_SIZE + KEY_SIZE;
        let internal_keys_fit = (PAGE_SIZE - internal_header_size) / internal_cell_size;
        let internal_max_keys =
            internal_max_keys.map_or(internal_keys_fit, |cap| cap.min(internal_keys_fit));
        if internal_max_keys == 0 {
            return Err(Error::InvalidConfig(
                "internal nodes must hold at least one key".to_string(),
            ));
        }

        Ok(Self {
            value_size,
            common_header_size,
            leaf_num_cells_offset,
            leaf_header_size,
            leaf_cell_size,
            leaf_space_for_cells,
            leaf_max_cells,
            leaf_left_split_count,
            leaf_right_split_count,
            internal_num_keys_offset,
            internal_right_child_offset,
            internal_header_size,
            internal_cell_size,
            internal_keys_fit,
            internal_max_keys,
        })
    }

    #[inline]
    pub fn leaf_cell_offset(&self, cell: usize) -> usize {
        self.leaf_header_size + cell * self.leaf_cell_size
    }

    #[inline]
    pub fn leaf_value_offset(&self, cell: usize) -> usize {
        self.leaf_cell_offset(cell) + KEY_SIZE
    }

    #[inline]
    pub fn internal_cell_offset(&self, cell: usize) -> usize {
        self.internal_header_size + cell * self.internal_cell_size
    }

    #[inline]
    pub fn internal_key_offset(&self, cell: usize) -> usize {
        self.internal_cell_offset(cell) + CHILD_POINTER_SIZE
    }
}

impl fmt::Display for NodeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROW_SIZE: {}", self.value_size)?;
        writeln!(f, "COMMON_NODE_HEADER_SIZE: {}", self.common_header_size)?;
        writeln!(f, "LEAF_NODE_HEADER_SIZE: {}", self.leaf_header_size)?;
        writeln!(f, "LEAF_NODE_CELL_SIZE: {}", self.leaf_cell_size)?;
        writeln!(f, "LEAF_NODE_SPACE_FOR_CELLS: {}", self.leaf_space_for_cells)?;
        writeln!(f, "LEAF_NODE_MAX_CELLS: {}", self.leaf_max_cells)?;
        write!(f, "INTERNAL_NODE_MAX_KEYS: {}", self.internal_max_keys)
    }
}
