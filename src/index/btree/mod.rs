//! B-tree index over fixed-width rows.
//!
//! # Structure
//! - [`NodeLayout`]: byte offsets of every node field, derived from the row width
//! - [`LeafNode`] / [`InternalNode`]: typed views over a page's bytes
//! - [`BTree`]: lookup, insert, leaf split and root promotion
//! - [`Cursor`]: ordered iteration and insert positioning
//!
//! Leaves hold sorted `(key, row)` cells. Internal nodes hold sorted
//! `(child, key)` cells plus a right child, where each key is the largest
//! key in its child's subtree. The root always lives on the same page.
//!
//! # Limitations
//! Internal nodes never split. Inserting into a leaf whose parent is full
//! fails with [`Error::SplitPropagationUnimplemented`](crate::Error::SplitPropagationUnimplemented).

mod cursor;
mod layout;
mod node;
mod tree;

pub use cursor::Cursor;
pub use layout::NodeLayout;
pub use node::{node_type, InternalNode, LeafNode};
pub use tree::{Ancestor, BTree};
