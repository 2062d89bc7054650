//! Pager - page-granular cache over the database file.
//!
//! The [`Pager`] handles all direct file operations:
//! - Loading pages lazily on first access
//! - Keeping every touched page resident until close
//! - Writing pages back (with a fresh checksum) on flush and close

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{info, trace};

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagerStats;

/// Caches the pages of a single database file.
///
/// # File Layout
/// The database is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (root)  │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// There is no file header; a file whose length is not a multiple of
/// [`PAGE_SIZE`] is rejected at open.
///
/// # Residency
/// There is no eviction. A page stays in memory from its first
/// [`get_page`](Pager::get_page) until [`close`](Pager::close), so the
/// number of pages is bounded by `max_pages` instead.
///
/// # Durability
/// Nothing is written until [`flush`](Pager::flush) or
/// [`close`](Pager::close). Dropping a `Pager` without closing it discards
/// every change since the last flush.
pub struct Pager {
    file: File,
    /// Length of the backing file in bytes.
    file_length: u64,
    /// Number of pages materialized so far (on disk or in memory).
    num_pages: u32,
    /// In-memory pages, indexed by page number.
    pages: Vec<Option<Box<Page>>>,
    /// Upper bound on page numbers.
    max_pages: u32,
    stats: PagerStats,
}

impl Pager {
    /// Open a database file, creating it if it doesn't exist.
    ///
    /// # Errors
    /// - `Error::CorruptFile` if the file length is not a whole number of pages
    /// - I/O errors from opening the file
    pub fn open<P: AsRef<Path>>(path: P, max_pages: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let file_length = file.metadata()?.len();
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(Error::CorruptFile(format!(
                "file length {} is not a multiple of the page size {}",
                file_length, PAGE_SIZE
            )));
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        info!(
            "opened {} ({} pages, limit {})",
            path.as_ref().display(),
            num_pages,
            max_pages
        );

        Ok(Self {
            file,
            file_length,
            num_pages,
            pages: Vec::new(),
            max_pages,
            stats: PagerStats::default(),
        })
    }

    /// Get the buffer for a page, loading it on first access.
    ///
    /// Pages inside the file's extent are read from disk and their checksum
    /// is verified; pages past the end start zeroed. Either way the page is
    /// counted in [`num_pages`](Pager::num_pages) from then on.
    ///
    /// # Errors
    /// - `Error::CapacityExceeded` if `page_id` is beyond `max_pages`
    /// - `Error::ChecksumMismatch` if the on-disk page is damaged
    /// - I/O errors from the read
    pub fn get_page(&mut self, page_id: PageId) -> Result<&mut Page> {
        if page_id.0 >= self.max_pages {
            return Err(Error::CapacityExceeded {
                page: page_id.0,
                max_pages: self.max_pages,
            });
        }

        let idx = page_id.index();
        if self.pages.len() <= idx {
            self.pages.resize_with(idx + 1, || None);
        }

        let page = match self.pages[idx].take() {
            Some(page) => {
                self.stats.cache_hits += 1;
                page
            }
            None => {
                self.stats.cache_misses += 1;
                let page = self.load(page_id)?;
                self.num_pages = self.num_pages.max(page_id.0 + 1);
                page
            }
        };

        Ok(&mut **self.pages[idx].insert(page))
    }

    /// Write a loaded page back to disk.
    ///
    /// # Errors
    /// - `Error::PageNotLoaded` if the page was never fetched
    /// - I/O errors from the seek or write
    pub fn flush(&mut self, page_id: PageId) -> Result<()> {
        let page = self
            .pages
            .get_mut(page_id.index())
            .and_then(|slot| slot.as_deref_mut())
            .ok_or(Error::PageNotLoaded(page_id.0))?;

        page.update_checksum();

        let offset = page_id.offset();
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;

        self.file_length = self.file_length.max(offset + PAGE_SIZE as u64);
        self.stats.pages_written += 1;
        trace!("flushed {}", page_id);

        Ok(())
    }

    /// Flush every loaded page, release the buffers and close the file.
    ///
    /// # Errors
    /// I/O errors from writing or syncing the file.
    pub fn close(mut self) -> Result<()> {
        for idx in 0..self.pages.len() {
            if self.pages[idx].is_some() {
                self.flush(PageId::new(idx as u32))?;
            }
        }
        self.pages.clear();

        // `File` reports nothing on drop, so surface write-back errors here.
        self.file.sync_all()?;

        info!("closed pager ({} pages): {}", self.num_pages, self.stats);
        Ok(())
    }

    /// Number of pages materialized so far.
    ///
    /// This is also the page number the next allocation will use.
    #[inline]
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Page number for a newly allocated page.
    ///
    /// Pages are never recycled, so new pages go at the end of the file.
    #[inline]
    pub fn unused_page_num(&self) -> PageId {
        PageId::new(self.num_pages)
    }

    /// Upper bound on the number of pages.
    #[inline]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Get a copy of the pager statistics.
    #[inline]
    pub fn stats(&self) -> PagerStats {
        self.stats
    }

    /// Materialize a page that is not in memory yet.
    fn load(&mut self, page_id: PageId) -> Result<Box<Page>> {
        let mut page = Box::new(Page::new());

        let pages_on_disk = self.file_length.div_ceil(PAGE_SIZE as u64);
        if (page_id.0 as u64) < pages_on_disk {
            self.file.seek(SeekFrom::Start(page_id.offset()))?;
            let bytes_read = read_full(&mut self.file, page.as_mut_slice())?;
            self.stats.pages_read += 1;

            // A short final read leaves the tail zero-filled; only full
            // pages carry a checksum worth checking.
            if bytes_read == PAGE_SIZE && !page.verify_checksum() {
                return Err(Error::ChecksumMismatch(page_id.0));
            }
            trace!("loaded {} from disk ({} bytes)", page_id, bytes_read);
        } else {
            trace!("materialized {} past end of file", page_id);
        }

        Ok(page)
    }
}

/// Read until `buf` is full or the file ends, returning the bytes read.
fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_new_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let pager = Pager::open(&path, 10).unwrap();
        assert_eq!(pager.num_pages(), 0);
        assert_eq!(pager.file_length(), 0);
        assert_eq!(pager.unused_page_num(), PageId::new(0));
        assert!(path.exists());
    }

    #[test]
    fn test_open_rejects_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        std::fs::write(&path, vec![0u8; PAGE_SIZE + 1]).unwrap();

        let result = Pager::open(&path, 10);
        assert!(matches!(result, Err(Error::CorruptFile(_))));
    }

    #[test]
    fn test_get_page_past_end_is_zeroed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut pager = Pager::open(&path, 10).unwrap();
        let page = pager.get_page(PageId::new(3)).unwrap();
        assert!(page.as_slice().iter().all(|&b| b == 0));

        // Materialized-page count jumps to n + 1
        assert_eq!(pager.num_pages(), 4);
        assert_eq!(pager.unused_page_num(), PageId::new(4));
    }

    #[test]
    fn test_get_page_beyond_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut pager = Pager::open(&path, 2).unwrap();
        assert!(pager.get_page(PageId::new(1)).is_ok());

        let result = pager.get_page(PageId::new(2));
        assert!(matches!(
            result,
            Err(Error::CapacityExceeded {
                page: 2,
                max_pages: 2
            })
        ));
    }

    #[test]
    fn test_flush_unloaded_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut pager = Pager::open(&path, 10).unwrap();
        assert!(matches!(
            pager.flush(PageId::new(0)),
            Err(Error::PageNotLoaded(0))
        ));
    }

    #[test]
    fn test_cache_hits_and_misses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut pager = Pager::open(&path, 10).unwrap();
        pager.get_page(PageId::new(0)).unwrap();
        pager.get_page(PageId::new(0)).unwrap();
        pager.get_page(PageId::new(0)).unwrap();

        let stats = pager.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.pages_read, 0);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        // Write and close
        {
            let mut pager = Pager::open(&path, 10).unwrap();
            pager.get_page(PageId::new(0)).unwrap().as_mut_slice()[100] = 0x42;
            pager.get_page(PageId::new(1)).unwrap().as_mut_slice()[4095] = 0x24;
            pager.close().unwrap();
        }

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2 * PAGE_SIZE as u64);

        // Reopen and verify
        {
            let mut pager = Pager::open(&path, 10).unwrap();
            assert_eq!(pager.num_pages(), 2);
            assert_eq!(pager.get_page(PageId::new(0)).unwrap().as_slice()[100], 0x42);
            assert_eq!(pager.get_page(PageId::new(1)).unwrap().as_slice()[4095], 0x24);
            assert_eq!(pager.stats().pages_read, 2);
        }
    }

    #[test]
    fn test_unflushed_changes_are_lost() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut pager = Pager::open(&path, 10).unwrap();
            pager.get_page(PageId::new(0)).unwrap().as_mut_slice()[100] = 0x42;
            // dropped without close
        }

        let pager = Pager::open(&path, 10).unwrap();
        assert_eq!(pager.num_pages(), 0);
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut pager = Pager::open(&path, 10).unwrap();
            pager.get_page(PageId::new(0)).unwrap().as_mut_slice()[500] = 0x01;
            pager.close().unwrap();
        }

        // Flip a byte behind the pager's back
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[500] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let mut pager = Pager::open(&path, 10).unwrap();
        assert!(matches!(
            pager.get_page(PageId::new(0)),
            Err(Error::ChecksumMismatch(0))
        ));
    }
}
