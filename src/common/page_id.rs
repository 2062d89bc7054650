//! Page identifier type.

use std::fmt;

/// Identifies a page in the database file.
///
/// Page N lives at file offset `N × PAGE_SIZE`. Page 0 is always the root
/// of the table's B-tree.
///
/// # Example
/// ```
/// use pagedb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.offset(), 42 * 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// The table root. Fixed for the lifetime of the file.
    pub const ROOT: PageId = PageId(0);

    /// Sentinel meaning "no page", stored as the parent of the root.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Byte offset of this page in the backing file.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.0 as u64 * crate::common::config::PAGE_SIZE as u64
    }

    /// Index into page-number-indexed collections.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
        assert!(pid.is_valid());
    }

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.0, u32::MAX);
        assert!(PageId::ROOT.is_valid());
    }

    #[test]
    fn test_page_id_offset() {
        assert_eq!(PageId::ROOT.offset(), 0);
        assert_eq!(PageId::new(3).offset(), 3 * 4096);
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
    }
}
