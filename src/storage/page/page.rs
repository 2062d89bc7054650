//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between disk and memory. The [`Pager`](crate::storage::Pager) keeps one
//! boxed `Page` per materialized page number.

use crate::common::config::PAGE_SIZE;

use super::page_header::{write_u32, PageHeader, PageType};

/// A page of data (4KB, 4KB-aligned).
///
/// # Memory Layout
/// - Size: 4096 bytes (4KB)
/// - Alignment: 4096 bytes
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code; copying 4KB should
/// be explicit (see [`Page::copy_from`]). A `#[cfg(test)]` Clone is
/// provided for tests.
///
/// # Example
/// ```
/// use pagedb::storage::page::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Overwrite this page with the contents of `other`.
    pub fn copy_from(&mut self, other: &Page) {
        self.data.copy_from_slice(&other.data);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Read the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    /// Write a page header.
    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Kind of node stored in this page.
    #[inline]
    pub fn page_type(&self) -> PageType {
        PageType::from_u8(self.data[PageHeader::OFFSET_PAGE_TYPE])
    }

    /// Whether this page holds the table root.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.data[PageHeader::OFFSET_IS_ROOT] != 0
    }

    /// Set the is-root flag, leaving the rest of the header alone.
    #[inline]
    pub fn set_root(&mut self, is_root: bool) {
        self.data[PageHeader::OFFSET_IS_ROOT] = is_root as u8;
    }

    /// Set the parent pointer, leaving the rest of the header alone.
    #[inline]
    pub fn set_parent(&mut self, parent: crate::common::PageId) {
        write_u32(&mut self.data, PageHeader::OFFSET_PARENT, parent.0);
    }

    /// Compute and store checksum in the header.
    ///
    /// Call this after all modifications to the page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        write_u32(&mut self.data, PageHeader::OFFSET_CHECKSUM, checksum);
    }

    /// Verify the page checksum is valid.
    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for Page {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for Page {
    #[inline]
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.copy_from(self);
        new_page
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageId;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_page_reset() {
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[100] = 0xAB;

        page.reset();

        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[100], 0);
    }

    #[test]
    fn test_copy_from() {
        let mut src = Page::new();
        src.as_mut_slice()[7] = 0x42;
        src.as_mut_slice()[4095] = 0x24;

        let mut dst = Page::new();
        dst.copy_from(&src);

        assert_eq!(dst.as_slice(), src.as_slice());
    }

    #[test]
    fn test_header_field_setters() {
        let mut page = Page::new();
        page.set_header(&PageHeader::new(PageType::BTreeLeaf));
        page.set_root(true);
        page.set_parent(PageId::new(9));

        assert_eq!(page.page_type(), PageType::BTreeLeaf);
        assert!(page.is_root());
        assert_eq!(page.header().parent, PageId::new(9));
    }

    #[test]
    fn test_checksum_stamp_and_verify() {
        let mut page = Page::new();
        page.set_header(&PageHeader::new(PageType::BTreeLeaf));
        page.as_mut_slice()[200] = 0x11;

        page.update_checksum();
        assert!(page.verify_checksum());

        page.as_mut_slice()[200] = 0x12;
        assert!(!page.verify_checksum());
    }

    #[test]
    fn test_page_clone_in_tests() {
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;

        let cloned = page.clone();
        assert_eq!(cloned.as_slice()[0], 0xAB);
    }
}
