//! Index structures.
//!
//! - [`btree`] - The B-tree that stores every row, keyed by id

pub mod btree;
