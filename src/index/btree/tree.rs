//! B-tree operations: lookup, insert, leaf split and root promotion.

use std::fmt::Write as _;

use log::{debug, warn};

use crate::common::{Error, PageId, Result};
use crate::index::btree::node::{node_type, InternalNode, LeafNode};
use crate::index::btree::{Cursor, NodeLayout};
use crate::storage::page::{Page, PageType};
use crate::storage::Pager;

/// One step of a root-to-leaf descent: the internal node visited and the
/// child index taken from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancestor {
    pub page: PageId,
    pub child_index: usize,
}

/// A B-tree handle over pages owned by a [`Pager`].
///
/// The root page number never changes. When the root splits, its contents
/// move to a new page and the root page is rewritten as an internal node.
///
/// All traversals are loops over an explicit path; a walk longer than the
/// pager's page limit can only come from a cycle and is reported as a
/// corrupt file.
pub struct BTree<'a> {
    pub(crate) pager: &'a mut Pager,
    pub(crate) layout: &'a NodeLayout,
    root: PageId,
}

impl<'a> BTree<'a> {
    pub fn new(pager: &'a mut Pager, layout: &'a NodeLayout, root: PageId) -> Self {
        Self {
            pager,
            layout,
            root,
        }
    }

    #[inline]
    pub fn root(&self) -> PageId {
        self.root
    }

    /// Write an empty root leaf into the root page.
    pub fn initialize_root(&mut self) -> Result<()> {
        let mut root = LeafNode::new(self.pager.get_page(self.root)?, self.layout);
        root.initialize();
        root.set_root(true);
        Ok(())
    }

    /// Check that the root page holds a root node.
    ///
    /// # Errors
    /// `Error::CorruptFile` if it doesn't, or if the root's cell count
    /// doesn't fit this layout.
    pub fn validate_root(&mut self) -> Result<()> {
        let root = self.root;
        if !self.node(root)?.is_root() {
            return Err(Error::CorruptFile(format!(
                "{} is not marked as the root",
                root
            )));
        }
        Ok(())
    }

    /// Fetch a node page, checking its type and its cell count.
    ///
    /// Every read of a node's cells goes through here, so a count that
    /// doesn't fit the layout is reported instead of indexing past the page.
    ///
    /// # Errors
    /// `Error::CorruptFile` if the page holds no node, or a leaf has more
    /// than `leaf_max_cells` cells, or an internal node more keys than fit.
    pub(crate) fn node(&mut self, page_id: PageId) -> Result<&mut Page> {
        let layout = self.layout;
        let page = self.pager.get_page(page_id)?;

        let (count, limit, kind) = match page.page_type() {
            PageType::BTreeLeaf => (
                LeafNode::new(&*page, layout).num_cells(),
                layout.leaf_max_cells,
                "cells",
            ),
            PageType::BTreeInternal => (
                InternalNode::new(&*page, layout).num_keys(),
                layout.internal_keys_fit,
                "keys",
            ),
            PageType::Invalid => return Err(not_a_node(page_id)),
        };
        if count > limit {
            return Err(Error::CorruptFile(format!(
                "{} claims {} {}, this layout holds at most {}",
                page_id, count, kind, limit
            )));
        }
        Ok(page)
    }

    /// Position a cursor at `key`, or where `key` would be inserted.
    pub fn find(mut self, key: u32) -> Result<Cursor<'a>> {
        let layout = self.layout;
        let mut path = Vec::new();
        let mut page_id = self.root;

        loop {
            self.check_depth(path.len())?;

            let page = self.node(page_id)?;
            match page.page_type() {
                PageType::BTreeLeaf => {
                    let cell = LeafNode::new(&*page, layout).find(key);
                    return Ok(Cursor::new(self, page_id, cell, path, false));
                }
                PageType::BTreeInternal => {
                    let node = InternalNode::new(&*page, layout);
                    let child_index = node.find_child_index(key);
                    let child = node.child(child_index);
                    path.push(Ancestor {
                        page: page_id,
                        child_index,
                    });
                    page_id = child;
                }
                PageType::Invalid => return Err(not_a_node(page_id)),
            }
        }
    }

    /// Position a cursor at the first cell of the leftmost leaf.
    pub fn start(mut self) -> Result<Cursor<'a>> {
        let mut path = Vec::new();
        let leaf = self.leftmost_leaf(self.root, &mut path)?;
        let layout = self.layout;
        let num_cells = LeafNode::new(self.node(leaf)?, layout).num_cells();

        let mut cursor = Cursor::new(self, leaf, 0, path, false);
        if num_cells == 0 {
            // Only an empty root leaf can be empty, but skip forward anyway.
            cursor.next_leaf()?;
        }
        Ok(cursor)
    }

    /// Descend from `page_id` through first children down to a leaf,
    /// recording the internal nodes visited in `path`.
    pub(crate) fn leftmost_leaf(
        &mut self,
        mut page_id: PageId,
        path: &mut Vec<Ancestor>,
    ) -> Result<PageId> {
        let layout = self.layout;
        loop {
            self.check_depth(path.len())?;

            let page = self.node(page_id)?;
            match page.page_type() {
                PageType::BTreeLeaf => return Ok(page_id),
                PageType::BTreeInternal => {
                    let child = InternalNode::new(&*page, layout).child(0);
                    path.push(Ancestor {
                        page: page_id,
                        child_index: 0,
                    });
                    page_id = child;
                }
                PageType::Invalid => return Err(not_a_node(page_id)),
            }
        }
    }

    /// Largest key stored under `page_id`.
    pub fn max_key(&mut self, mut page_id: PageId) -> Result<u32> {
        let layout = self.layout;
        for _ in 0..=self.pager.max_pages() {
            let page = self.node(page_id)?;
            match page.page_type() {
                PageType::BTreeLeaf => {
                    return LeafNode::new(&*page, layout).max_key().ok_or_else(|| {
                        Error::CorruptFile(format!("{} is an empty non-root leaf", page_id))
                    });
                }
                PageType::BTreeInternal => {
                    page_id = InternalNode::new(&*page, layout).right_child();
                }
                PageType::Invalid => return Err(not_a_node(page_id)),
            }
        }
        Err(too_deep())
    }

    /// Insert `(key, value)` into the leaf at (`page_id`, `cell`), the
    /// position `find` returned for `key`.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if the cell already holds `key`
    /// - `Error::TableFull` if a split would exceed the page limit
    /// - `Error::SplitPropagationUnimplemented` if the parent of a
    ///   splitting leaf is full
    ///
    /// All three are detected before any page is modified.
    pub(crate) fn insert_at(
        &mut self,
        page_id: PageId,
        cell: usize,
        path: &[Ancestor],
        key: u32,
        value: &[u8],
    ) -> Result<()> {
        let layout = self.layout;
        let mut leaf = LeafNode::new(self.node(page_id)?, layout);
        let num_cells = leaf.num_cells();

        if cell < num_cells && leaf.key(cell) == key {
            warn!("rejected duplicate key {}", key);
            return Err(Error::DuplicateKey(key));
        }

        if num_cells < layout.leaf_max_cells {
            leaf.insert_cell(cell, key, value);
            return Ok(());
        }

        let is_root = leaf.is_root();
        self.check_split_capacity(is_root, path)?;

        let right = self.split_leaf_and_insert(page_id, cell, key, value)?;
        if is_root {
            self.create_new_root(right)
        } else {
            // checked above
            match path.last() {
                Some(&parent) => self.insert_into_parent(parent, page_id, right),
                None => Err(Error::CorruptFile(format!(
                    "{} is not the root but has no parent",
                    page_id
                ))),
            }
        }
    }

    /// Reject a split that can't complete, before anything is written.
    fn check_split_capacity(&mut self, is_root: bool, path: &[Ancestor]) -> Result<()> {
        // A root split needs a page for each half; any other split one.
        let needed = if is_root { 2 } else { 1 };
        if self.pager.num_pages() as u64 + needed > self.pager.max_pages() as u64 {
            warn!(
                "table full: {} pages in use, limit {}",
                self.pager.num_pages(),
                self.pager.max_pages()
            );
            return Err(Error::TableFull {
                max_pages: self.pager.max_pages(),
            });
        }

        if !is_root {
            let parent = path.last().ok_or_else(|| {
                Error::CorruptFile("non-root leaf reached without a parent".to_string())
            })?;
            let layout = self.layout;
            let node = InternalNode::new(self.node(parent.page)?, layout);
            if node.is_full() {
                return Err(Error::SplitPropagationUnimplemented(parent.page.0));
            }
        }
        Ok(())
    }

    /// Split the full leaf `page_id` around the new cell.
    ///
    /// The `max_cells` old cells plus the new one form a virtual sorted array;
    /// the lower `leaf_left_split_count` entries stay in `page_id` and the
    /// rest move to a new leaf, whose page number is returned.
    fn split_leaf_and_insert(
        &mut self,
        page_id: PageId,
        cell: usize,
        key: u32,
        value: &[u8],
    ) -> Result<PageId> {
        let layout = self.layout;
        let right_page = self.pager.unused_page_num();

        let mut old = Page::new();
        old.copy_from(self.pager.get_page(page_id)?);
        let old_leaf = LeafNode::new(&old, layout);

        {
            let mut right = LeafNode::new(self.pager.get_page(right_page)?, layout);
            right.initialize();
            right.set_parent(old_leaf.parent());
        }

        // Walk from the highest virtual index down, routing each entry to
        // its final slot in the left or right leaf.
        for i in (0..=layout.leaf_max_cells).rev() {
            let (dest_page, dest_cell) = if i >= layout.leaf_left_split_count {
                (right_page, i - layout.leaf_left_split_count)
            } else {
                (page_id, i)
            };
            let mut dest = LeafNode::new(self.pager.get_page(dest_page)?, layout);

            if i == cell {
                dest.write_cell(dest_cell, key, value);
            } else if i > cell {
                dest.cell_mut(dest_cell).copy_from_slice(old_leaf.cell(i - 1));
            } else {
                dest.cell_mut(dest_cell).copy_from_slice(old_leaf.cell(i));
            }
        }

        LeafNode::new(self.pager.get_page(page_id)?, layout)
            .set_num_cells(layout.leaf_left_split_count);
        LeafNode::new(self.pager.get_page(right_page)?, layout)
            .set_num_cells(layout.leaf_right_split_count);

        debug!(
            "split leaf {} into {} ({} cells) and {} ({} cells)",
            page_id,
            page_id,
            layout.leaf_left_split_count,
            right_page,
            layout.leaf_right_split_count
        );
        Ok(right_page)
    }

    /// Move the root's contents to a new left child and rewrite the root
    /// page as an internal node over (left child, `right_child`).
    fn create_new_root(&mut self, right_child: PageId) -> Result<()> {
        let layout = self.layout;
        let root = self.root;
        let left_child = self.pager.unused_page_num();

        let mut snapshot = Page::new();
        snapshot.copy_from(self.pager.get_page(root)?);
        {
            let left = self.pager.get_page(left_child)?;
            left.copy_from(&snapshot);
            left.set_root(false);
            left.set_parent(root);
        }

        if node_type(snapshot.as_slice()) == PageType::BTreeInternal {
            for child in InternalNode::new(&snapshot, layout).children() {
                self.pager.get_page(child)?.set_parent(left_child);
            }
        }

        let left_max = self.max_key(left_child)?;
        self.pager.get_page(right_child)?.set_parent(root);

        let mut node = InternalNode::new(self.pager.get_page(root)?, layout);
        node.initialize();
        node.set_root(true);
        node.insert_cell(0, left_child, left_max);
        node.set_right_child(right_child);

        debug!(
            "promoted root {}: left {} (max key {}), right {}",
            root, left_child, left_max, right_child
        );
        Ok(())
    }

    /// Register the new leaf `right` (split off `left`) with their parent.
    fn insert_into_parent(&mut self, parent: Ancestor, left: PageId, right: PageId) -> Result<()> {
        let left_max = self.max_key(left)?;
        self.pager.get_page(right)?.set_parent(parent.page);

        let mut node = InternalNode::new(self.pager.get_page(parent.page)?, self.layout);
        let num_keys = node.num_keys();

        if parent.child_index == num_keys {
            // `left` was the right child; it becomes the last cell.
            node.insert_cell(num_keys, left, left_max);
            node.set_right_child(right);
        } else {
            let old_key = node.key(parent.child_index);
            node.set_key(parent.child_index, left_max);
            node.insert_cell(parent.child_index + 1, right, old_key);
        }

        debug!(
            "added {} to parent {} after {} (separator {})",
            right, parent.page, left, left_max
        );
        Ok(())
    }

    /// Render the tree, one node or key per line, indented by depth.
    pub fn dump(&mut self) -> Result<String> {
        enum Item {
            Node(PageId, usize),
            Key(u32, usize),
        }

        let layout = self.layout;
        let mut out = String::new();
        let mut stack = vec![Item::Node(self.root, 0)];
        let mut visited = 0u32;

        while let Some(item) = stack.pop() {
            match item {
                Item::Key(key, depth) => {
                    let _ = writeln!(out, "{}- key {}", indent(depth), key);
                }
                Item::Node(page_id, depth) => {
                    visited += 1;
                    if visited > self.pager.max_pages() {
                        return Err(too_deep());
                    }

                    let page = self.node(page_id)?;
                    match page.page_type() {
                        PageType::BTreeLeaf => {
                            let leaf = LeafNode::new(&*page, layout);
                            let num_cells = leaf.num_cells();
                            let _ = writeln!(out, "{}- leaf (size {})", indent(depth), num_cells);
                            for i in 0..num_cells {
                                let _ = writeln!(out, "{}- {}", indent(depth + 1), leaf.key(i));
                            }
                        }
                        PageType::BTreeInternal => {
                            let node = InternalNode::new(&*page, layout);
                            let num_keys = node.num_keys();
                            let _ =
                                writeln!(out, "{}- internal (size {})", indent(depth), num_keys);

                            stack.push(Item::Node(node.right_child(), depth + 1));
                            for i in (0..num_keys).rev() {
                                stack.push(Item::Key(node.key(i), depth + 1));
                                stack.push(Item::Node(node.child(i), depth + 1));
                            }
                        }
                        PageType::Invalid => return Err(not_a_node(page_id)),
                    }
                }
            }
        }

        Ok(out)
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.pager.max_pages() as usize {
            return Err(too_deep());
        }
        Ok(())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn not_a_node(page_id: PageId) -> Error {
    Error::CorruptFile(format!("{} does not hold a B-tree node", page_id))
}

fn too_deep() -> Error {
    Error::CorruptFile("B-tree walk visited more nodes than the file can hold".to_string())
}
