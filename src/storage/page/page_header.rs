//! Page header and type definitions.
//!
//! Every page holds one B-tree node and starts with a [`PageHeader`]:
//! - [`PageType`] discriminator (leaf or internal)
//! - is-root flag
//! - parent page number
//! - CRC32 checksum for integrity

use crate::common::PageId;

/// Kind of node stored in a page.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Uninitialized or corrupted page.
    #[default]
    Invalid = 0,
    /// B-tree internal (non-leaf) node.
    BTreeInternal = 2,
    /// B-tree leaf node.
    BTreeLeaf = 3,
}

impl PageType {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => PageType::BTreeInternal,
            3 => PageType::BTreeLeaf,
            _ => PageType::Invalid,
        }
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (10 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       1     is_root (0 or 1)
/// 2       4     parent (PageId, little-endian)
/// 6       4     checksum (CRC32, little-endian)
/// ```
///
/// # Checksum
/// The checksum is computed over the entire page with the checksum field
/// itself set to zero. The pager stamps it on flush and verifies it on load.
///
/// # Parent
/// Written whenever a node is created or moved. Tree maintenance does not
/// read it; ancestors are found through the descent path instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Kind of node in this page.
    pub page_type: PageType,
    /// Whether this node is the table root.
    pub is_root: bool,
    /// Parent node, or [`PageId::INVALID`] for the root.
    pub parent: PageId,
    /// CRC32 checksum of the page contents.
    pub checksum: u32,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 10;

    /// Offset of each field within the header.
    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_IS_ROOT: usize = 1;
    pub const OFFSET_PARENT: usize = 2;
    pub const OFFSET_CHECKSUM: usize = 6;

    /// Create a new non-root header with the given page type.
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            is_root: false,
            parent: PageId::INVALID,
            checksum: 0,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        Self {
            page_type: PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]),
            is_root: data[Self::OFFSET_IS_ROOT] != 0,
            parent: PageId(read_u32(data, Self::OFFSET_PARENT)),
            checksum: read_u32(data, Self::OFFSET_CHECKSUM),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_IS_ROOT] = self.is_root as u8;
        write_u32(data, Self::OFFSET_PARENT, self.parent.0);
        write_u32(data, Self::OFFSET_CHECKSUM, self.checksum);
    }

    /// Compute CRC32 checksum of a page.
    ///
    /// The checksum field (bytes 6-9) is fed as zeros, so the checksum
    /// doesn't include itself.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();

        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);

        hasher.finalize()
    }

    /// Verify that the stored checksum matches the computed checksum.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new(PageType::Invalid)
    }
}

/// Read a little-endian u32 at `offset`.
#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

/// Write a little-endian u32 at `offset`.
#[inline]
pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    // --- PageType tests ---

    #[test]
    fn test_page_type_from_u8() {
        assert_eq!(PageType::from_u8(0), PageType::Invalid);
        assert_eq!(PageType::from_u8(2), PageType::BTreeInternal);
        assert_eq!(PageType::from_u8(3), PageType::BTreeLeaf);
        assert_eq!(PageType::from_u8(1), PageType::Invalid);
        assert_eq!(PageType::from_u8(255), PageType::Invalid);
    }

    #[test]
    fn test_page_type_default() {
        assert_eq!(PageType::default(), PageType::Invalid);
    }

    // --- PageHeader tests ---

    #[test]
    fn test_page_header_new() {
        let header = PageHeader::new(PageType::BTreeLeaf);
        assert_eq!(header.page_type, PageType::BTreeLeaf);
        assert!(!header.is_root);
        assert_eq!(header.parent, PageId::INVALID);
        assert_eq!(header.checksum, 0);
    }

    #[test]
    fn test_page_header_roundtrip() {
        let original = PageHeader {
            page_type: PageType::BTreeInternal,
            is_root: true,
            parent: PageId::new(7),
            checksum: 0xDEADBEEF,
        };

        let mut buffer = [0u8; PageHeader::SIZE];
        original.write_to(&mut buffer);

        assert_eq!(PageHeader::from_bytes(&buffer), original);
    }

    #[test]
    fn test_page_header_byte_layout() {
        let header = PageHeader {
            page_type: PageType::BTreeLeaf,
            is_root: true,
            parent: PageId::new(0x04030201),
            checksum: 0x08070605,
        };

        let mut buffer = [0u8; PageHeader::SIZE];
        header.write_to(&mut buffer);

        assert_eq!(buffer[0], 3); // PageType::BTreeLeaf
        assert_eq!(buffer[1], 1); // is_root
        assert_eq!(buffer[2], 0x01); // parent byte 0 (LSB)
        assert_eq!(buffer[5], 0x04); // parent byte 3 (MSB)
        assert_eq!(buffer[6], 0x05); // checksum byte 0 (LSB)
        assert_eq!(buffer[9], 0x08); // checksum byte 3 (MSB)
    }

    // --- Checksum tests ---

    #[test]
    fn test_checksum_changes_with_data() {
        let mut page1 = [0u8; PAGE_SIZE];
        let mut page2 = [0u8; PAGE_SIZE];

        page1[500] = 0xFF;
        page2[500] = 0xFE;

        assert_ne!(
            PageHeader::compute_checksum(&page1),
            PageHeader::compute_checksum(&page2)
        );
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[100] = 0xAB;

        let checksum1 = PageHeader::compute_checksum(&page_data);

        page_data[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&[0xFF; 4]);

        assert_eq!(checksum1, PageHeader::compute_checksum(&page_data));
    }

    #[test]
    fn test_checksum_verify() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[100] = 0xAB;

        let header = PageHeader {
            checksum: PageHeader::compute_checksum(&page_data),
            ..PageHeader::new(PageType::BTreeLeaf)
        };
        assert!(header.verify_checksum(&page_data));

        // Corrupt the page
        page_data[100] = 0xFF;
        assert!(!header.verify_checksum(&page_data));
    }
}
