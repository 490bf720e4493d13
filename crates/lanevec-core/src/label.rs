//! Fixed-length buffer labels for memory tracking.

use std::fmt;

/// A fixed-length, NUL-padded name attached to a buffer.
///
/// Labels exist purely so that an external tracker can attribute memory
/// to a subsystem. They carry no semantic weight. Text longer than
/// [`Label::MAX_LEN`] bytes is truncated at the last character boundary
/// that fits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    bytes: [u8; Label::CAPACITY],
    len: u8,
}

impl Label {
    /// Size of the backing array, including the reserved terminator byte.
    pub const CAPACITY: usize = 64;

    /// Maximum number of text bytes a label keeps.
    pub const MAX_LEN: usize = Self::CAPACITY - 1;

    /// The empty label. Buffers with an empty label are never tracked.
    pub const EMPTY: Label = Label {
        bytes: [0; Self::CAPACITY],
        len: 0,
    };

    /// Build a label from `text`, truncating to [`Label::MAX_LEN`] bytes.
    pub fn new(text: &str) -> Self {
        let mut end = text.len().min(Self::MAX_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = [0; Self::CAPACITY];
        bytes[..end].copy_from_slice(&text.as_bytes()[..end]);
        Self {
            bytes,
            len: end as u8,
        }
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        // Construction only copies whole UTF-8 characters.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }

    /// Whether the label is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the label text in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", self.as_str())
    }
}
