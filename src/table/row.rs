//! Row codec - fixed-width binary (de)serialization of one row.

use std::fmt;

use crate::common::config::{COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE};
use crate::common::{Error, Result};

/// One record of the table.
///
/// `id` is the B-tree key. The string fields are stored NUL-padded to the
/// widths of the [`RowSchema`]; trailing NULs are stripped on decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    /// Create a row. Field widths are checked on insert, not here.
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

/// Field widths of a row, and the byte layout derived from them.
///
/// # Layout
/// ```text
/// Offset              Size            Field
/// ------              ----            -----
/// 0                   4               id (u32, little-endian)
/// 4                   username_len    username (NUL-padded)
/// 4 + username_len    email_len       email (NUL-padded)
/// ```
///
/// # Example
/// ```
/// use pagedb::{Row, RowSchema};
///
/// let schema = RowSchema::default();
/// let row = Row::new(1, "alice", "alice@example.com");
///
/// let bytes = schema.encode(&row);
/// assert_eq!(bytes.len(), schema.row_size());
/// assert_eq!(schema.decode(&bytes), row);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    pub username_len: usize,
    pub email_len: usize,
}

impl RowSchema {
    pub const ID_OFFSET: usize = 0;
    pub const ID_SIZE: usize = 4;
    pub const USERNAME_OFFSET: usize = Self::ID_OFFSET + Self::ID_SIZE;

    pub fn new(username_len: usize, email_len: usize) -> Self {
        Self {
            username_len,
            email_len,
        }
    }

    #[inline]
    pub fn email_offset(&self) -> usize {
        Self::USERNAME_OFFSET.saturating_add(self.username_len)
    }

    /// Size of a serialized row in bytes.
    #[inline]
    pub fn row_size(&self) -> usize {
        self.email_offset().saturating_add(self.email_len)
    }

    /// Check that every field of `row` fits its column.
    ///
    /// NUL is the padding byte, so a field may not contain one.
    ///
    /// # Errors
    /// - `Error::FieldTooLong` naming the first field that doesn't fit
    /// - `Error::FieldContainsNul` naming the first field with a NUL byte
    pub fn validate(&self, row: &Row) -> Result<()> {
        check_width("username", &row.username, self.username_len)?;
        check_width("email", &row.email, self.email_len)
    }

    /// Serialize `row` into a new buffer of [`row_size`](Self::row_size) bytes.
    ///
    /// # Panics
    /// Panics if a field is wider than its column; call
    /// [`validate`](Self::validate) first.
    pub fn encode(&self, row: &Row) -> Vec<u8> {
        let mut buf = vec![0u8; self.row_size()];
        self.encode_into(row, &mut buf);
        buf
    }

    /// Serialize `row` into `dst`, which must be exactly one row long.
    ///
    /// # Panics
    /// Panics on a wrong-sized buffer or an oversized field.
    pub fn encode_into(&self, row: &Row, dst: &mut [u8]) {
        assert_eq!(dst.len(), self.row_size(), "row buffer has the wrong size");

        dst[Self::ID_OFFSET..Self::USERNAME_OFFSET].copy_from_slice(&row.id.to_le_bytes());
        write_padded(
            &mut dst[Self::USERNAME_OFFSET..self.email_offset()],
            row.username.as_bytes(),
        );
        write_padded(&mut dst[self.email_offset()..], row.email.as_bytes());
    }

    /// Deserialize a row from a buffer of exactly one row.
    ///
    /// # Panics
    /// Panics on a wrong-sized buffer.
    pub fn decode(&self, src: &[u8]) -> Row {
        assert_eq!(src.len(), self.row_size(), "row buffer has the wrong size");

        let mut id = [0u8; Self::ID_SIZE];
        id.copy_from_slice(&src[Self::ID_OFFSET..Self::USERNAME_OFFSET]);

        Row {
            id: u32::from_le_bytes(id),
            username: read_padded(&src[Self::USERNAME_OFFSET..self.email_offset()]),
            email: read_padded(&src[self.email_offset()..]),
        }
    }
}

impl Default for RowSchema {
    fn default() -> Self {
        Self::new(COLUMN_USERNAME_SIZE, COLUMN_EMAIL_SIZE)
    }
}

fn check_width(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.contains('\0') {
        return Err(Error::FieldContainsNul { field });
    }
    if value.len() > max {
        return Err(Error::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

fn write_padded(dst: &mut [u8], value: &[u8]) {
    assert!(value.len() <= dst.len(), "field wider than its column");
    dst[..value.len()].copy_from_slice(value);
    dst[value.len()..].fill(0);
}

fn read_padded(src: &[u8]) -> String {
    let end = src.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&src[..end]).into_owned()
}
