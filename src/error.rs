//! Error types for pagedb.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagedb.
///
/// Errors fall into two classes. Recoverable errors reject a single insert
/// and leave the table untouched; fatal errors mean the engine cannot make
/// progress and the caller is expected to stop (see [`Error::is_fatal`]).
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a read, write, seek or sync on the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An insert used a key that is already present.
    #[error("Duplicate key {0}")]
    DuplicateKey(u32),

    /// An insert needed more pages than the table may hold.
    #[error("Table full: the table is limited to {max_pages} pages")]
    TableFull { max_pages: u32 },

    /// A page number beyond the configured page limit was requested.
    #[error("Page {page} exceeds the page limit of {max_pages}")]
    CapacityExceeded { page: u32, max_pages: u32 },

    /// Tried to flush a page that was never loaded.
    ///
    /// This indicates a bug in the caller.
    #[error("Page {0} is not loaded")]
    PageNotLoaded(u32),

    /// A leaf split needed to add a child to an internal node that is
    /// already full. Splitting internal nodes is not supported.
    #[error("Internal node on page {0} is full; splitting internal nodes is not implemented")]
    SplitPropagationUnimplemented(u32),

    /// The database file is not laid out the way pagedb writes it.
    #[error("Corrupt database file: {0}")]
    CorruptFile(String),

    /// A page loaded from disk failed CRC32 verification.
    #[error("Checksum mismatch for page {0}")]
    ChecksumMismatch(u32),

    /// A string field is wider than the row schema allows.
    #[error("Field `{field}` is {len} bytes long, the limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A string field holds a NUL byte, which the padded encoding can't keep.
    #[error("Field `{field}` contains a NUL byte")]
    FieldContainsNul { field: &'static str },

    /// A `TableConfig` that no table can be built from.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the error leaves the engine unable to continue.
    ///
    /// Rejected inserts (duplicates, a full table, unstorable fields) are
    /// not fatal: the table is unchanged and later operations may succeed.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::DuplicateKey(_)
                | Error::TableFull { .. }
                | Error::FieldTooLong { .. }
                | Error::FieldContainsNul { .. }
        )
    }
}
