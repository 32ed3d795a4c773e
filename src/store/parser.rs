use crate::{
    store::io::{read_le_at, StoreIO},
    Error::OutOfBounds,
    Result,
};

/// A cursor over an encoded store buffer.
///
/// `Parser` keeps a read position and bounds-checks every access, returning
/// [`crate::Error::OutOfBounds`] instead of panicking on truncated input. On top of the
/// primitive reads it knows the length-prefixed encodings used by the store codec.
///
/// # Examples
///
/// ```rust,ignore
/// use obsdata::store::Parser;
///
/// let data = [0x02, 0x00, 0x00, 0x00, b'o', b'k'];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_string()?, "ok");
/// assert!(!parser.has_more_data());
/// # Ok::<(), obsdata::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a little-endian primitive and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_le<T: StoreIO>(&mut self) -> Result<T> {
        read_le_at(self.data, &mut self.position)
    }

    /// Read `len` raw bytes and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(len) else {
            return Err(OutOfBounds);
        };
        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Read a `u32` length followed by that many UTF-8 bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on truncation and [`crate::Error::Malformed`]
    /// if the bytes are not valid UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_le::<u32>()? as usize;
        let bytes = self.read_bytes(len)?;
        match std::str::from_utf8(bytes) {
            Ok(value) => Ok(value.to_string()),
            Err(error) => Err(malformed_error!(
                "Invalid UTF-8 string at offset {} - {}",
                self.position - len,
                error
            )),
        }
    }

    /// Read a `u64` element count and make sure at least `count * min_size` bytes remain.
    ///
    /// Guards allocations against corrupted counts before any element is decoded.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the count cannot possibly fit.
    pub fn read_count(&mut self, min_size: usize) -> Result<usize> {
        let count = self.read_le::<u64>()?;
        let Ok(count) = usize::try_from(count) else {
            return Err(OutOfBounds);
        };

        let remaining = self.data.len() - self.position;
        match count.checked_mul(min_size) {
            Some(needed) if needed <= remaining => Ok(count),
            _ => Err(OutOfBounds),
        }
    }
}
