//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`PageHeader`] - The common node header at the start of every page
//! - [`PageType`] - Discriminator for leaf and internal nodes

#[allow(clippy::module_inception)]
mod page;
mod page_header;

pub use page::Page;
pub use page_header::{PageHeader, PageType};

pub(crate) use page_header::{read_u32, write_u32};
