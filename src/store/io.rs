//! Little-endian primitive reading and writing for the store codec.
//!
//! The store format is little endian throughout. [`StoreIO`] abstracts over the primitive
//! types the codec needs. [`read_le_at`] is the bounds-checked read behind
//! [`crate::store::Parser`], and [`push_le`] appends to the buffer the encoder grows.
//!
//! All reads return [`crate::Error::OutOfBounds`] when the buffer is too short, so a
//! truncated store can never cause a panic during decoding.

use crate::{Error::OutOfBounds, Result};

/// Primitive value with a fixed-size little-endian byte representation.
pub trait StoreIO: Sized + Copy {
    /// The byte array holding one encoded value
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decodes a value from its little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Encodes a value into its little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_store_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StoreIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_store_io!(u8, u16, u32, u64, i64, f64);

/// Reads a value at `offset` and advances the offset past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: StoreIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Appends a value to a growing buffer.
pub fn push_le<T: StoreIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}
