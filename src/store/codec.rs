//! Binary encoding of a [`Group`] tree.
//!
//! ```text
//! magic   "OBSD"
//! version u16
//! group   := attr_count u32, attr*, data_count u32, data*, group_count u32, (name, group)*
//! attr    := name, tag u8, value
//! data    := name, tag u8, payload
//! string  := len u32, utf-8 bytes
//! trailer := SHA-1 of every preceding byte
//! ```
//!
//! All integers are little endian. Decoding verifies the digest before touching the
//! payload, and every length is checked against the remaining buffer before anything is
//! allocated.

use sha1::{Digest, Sha1};

use crate::{
    store::{
        group::{Attr, Data, Group},
        io::push_le,
        parser::Parser,
    },
    Result,
};

/// Leading bytes of every encoded store
pub const STORE_MAGIC: [u8; 4] = *b"OBSD";

/// Format version written by this crate
pub const STORE_VERSION: u16 = 1;

const DIGEST_LEN: usize = 20;
const MAX_DEPTH: usize = 64;

const ATTR_STR: u8 = 1;
const ATTR_INT: u8 = 2;
const ATTR_FLOAT: u8 = 3;
const ATTR_STR_LIST: u8 = 4;

const DATA_FLOAT: u8 = 1;
const DATA_BOOL: u8 = 2;
const DATA_TEXT: u8 = 3;

/// Encodes a group tree, including header and integrity trailer.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if a name, string or count does not fit its `u32`
/// length prefix, or if groups nest deeper than a store can be decoded.
pub fn encode(root: &Group) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(1024);
    buffer.extend_from_slice(&STORE_MAGIC);
    push_le(&mut buffer, STORE_VERSION);
    encode_group(&mut buffer, root, 0)?;

    let mut hasher = Sha1::new();
    hasher.update(&buffer);
    let digest = hasher.finalize();
    buffer.extend_from_slice(digest.as_slice());
    Ok(buffer)
}

/// Decodes a buffer produced by [`encode`].
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for a wrong magic, version, tag or digest, or for
/// trailing bytes, and [`crate::Error::OutOfBounds`] for truncated content.
pub fn decode(data: &[u8]) -> Result<Group> {
    if data.len() < STORE_MAGIC.len() + 2 + DIGEST_LEN {
        return Err(malformed_error!(
            "Store is too small - {} bytes",
            data.len()
        ));
    }
    if data[..STORE_MAGIC.len()] != STORE_MAGIC {
        return Err(malformed_error!("Invalid store magic"));
    }

    let (payload, digest) = data.split_at(data.len() - DIGEST_LEN);
    let mut hasher = Sha1::new();
    hasher.update(payload);
    if hasher.finalize().as_slice() != digest {
        return Err(malformed_error!("Store digest mismatch"));
    }

    let mut parser = Parser::new(&payload[STORE_MAGIC.len()..]);
    let version = parser.read_le::<u16>()?;
    if version != STORE_VERSION {
        return Err(malformed_error!("Unsupported store version - {}", version));
    }

    let root = decode_group(&mut parser, 0)?;
    if parser.has_more_data() {
        return Err(malformed_error!(
            "Trailing bytes after root group at offset {}",
            parser.pos()
        ));
    }

    Ok(root)
}

fn push_len(buffer: &mut Vec<u8>, len: usize) -> Result<()> {
    let Ok(len) = u32::try_from(len) else {
        return Err(malformed_error!(
            "Length {} exceeds the u32 limit of the store format",
            len
        ));
    };
    push_le(buffer, len);
    Ok(())
}

fn push_string(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    push_len(buffer, value.len())?;
    buffer.extend_from_slice(value.as_bytes());
    Ok(())
}

fn encode_group(buffer: &mut Vec<u8>, group: &Group, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(malformed_error!(
            "Group nesting exceeds {} levels",
            MAX_DEPTH
        ));
    }

    let attrs: Vec<_> = group.attrs().collect();
    push_len(buffer, attrs.len())?;
    for (name, attr) in attrs {
        push_string(buffer, name)?;
        match attr {
            Attr::Str(value) => {
                push_le(buffer, ATTR_STR);
                push_string(buffer, value)?;
            }
            Attr::Int(value) => {
                push_le(buffer, ATTR_INT);
                push_le(buffer, *value);
            }
            Attr::Float(value) => {
                push_le(buffer, ATTR_FLOAT);
                push_le(buffer, *value);
            }
            Attr::StrList(values) => {
                push_le(buffer, ATTR_STR_LIST);
                push_le(buffer, values.len() as u64);
                for value in values {
                    push_string(buffer, value)?;
                }
            }
        }
    }

    let blocks: Vec<_> = group.data_blocks().collect();
    push_len(buffer, blocks.len())?;
    for (name, data) in blocks {
        push_string(buffer, name)?;
        match data {
            Data::Float { shape, values } => {
                push_le(buffer, DATA_FLOAT);
                push_len(buffer, shape.len())?;
                for dim in shape {
                    push_le(buffer, *dim as u64);
                }
                for value in values {
                    push_le(buffer, *value);
                }
            }
            Data::Bool(values) => {
                push_le(buffer, DATA_BOOL);
                push_le(buffer, values.len() as u64);
                for value in values {
                    push_le(buffer, u8::from(*value));
                }
            }
            Data::Text(values) => {
                push_le(buffer, DATA_TEXT);
                push_le(buffer, values.len() as u64);
                for value in values {
                    push_string(buffer, value)?;
                }
            }
        }
    }

    let children: Vec<_> = group.groups().collect();
    push_len(buffer, children.len())?;
    for (name, child) in children {
        push_string(buffer, name)?;
        encode_group(buffer, child, depth + 1)?;
    }
    Ok(())
}

fn decode_group(parser: &mut Parser<'_>, depth: usize) -> Result<Group> {
    if depth > MAX_DEPTH {
        return Err(malformed_error!(
            "Group nesting exceeds {} levels",
            MAX_DEPTH
        ));
    }

    let mut group = Group::new();

    let attr_count = parser.read_le::<u32>()?;
    for _ in 0..attr_count {
        let name = parser.read_string()?;
        let attr = match parser.read_le::<u8>()? {
            ATTR_STR => Attr::Str(parser.read_string()?),
            ATTR_INT => Attr::Int(parser.read_le::<i64>()?),
            ATTR_FLOAT => Attr::Float(parser.read_le::<f64>()?),
            ATTR_STR_LIST => {
                let count = parser.read_count(4)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(parser.read_string()?);
                }
                Attr::StrList(values)
            }
            tag => {
                return Err(malformed_error!(
                    "Unknown attribute tag {} for '{}'",
                    tag,
                    name
                ))
            }
        };
        group.set_attr(&name, attr);
    }

    let data_count = parser.read_le::<u32>()?;
    for _ in 0..data_count {
        let name = parser.read_string()?;
        let data = match parser.read_le::<u8>()? {
            DATA_FLOAT => decode_float(parser, &name)?,
            DATA_BOOL => {
                let count = parser.read_count(1)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(parser.read_le::<u8>()? != 0);
                }
                Data::Bool(values)
            }
            DATA_TEXT => {
                let count = parser.read_count(4)?;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(parser.read_string()?);
                }
                Data::Text(values)
            }
            tag => {
                return Err(malformed_error!(
                    "Unknown data tag {} for '{}'",
                    tag,
                    name
                ))
            }
        };
        group.set_data(&name, data);
    }

    let group_count = parser.read_le::<u32>()?;
    for _ in 0..group_count {
        let name = parser.read_string()?;
        let child = decode_group(parser, depth + 1)?;
        group.insert_group(&name, child);
    }

    Ok(group)
}

fn decode_float(parser: &mut Parser<'_>, name: &str) -> Result<Data> {
    let ndim = parser.read_le::<u32>()?;
    let mut shape = Vec::with_capacity(ndim.min(8) as usize);
    let mut total = 1_usize;
    for _ in 0..ndim {
        let Ok(dim) = usize::try_from(parser.read_le::<u64>()?) else {
            return Err(malformed_error!("Dimension of '{}' does not fit", name));
        };
        total = total
            .checked_mul(dim)
            .ok_or_else(|| malformed_error!("Shape of '{}' overflows", name))?;
        shape.push(dim);
    }

    let remaining = parser.len() - parser.pos();
    match total.checked_mul(8) {
        Some(needed) if needed <= remaining => {}
        _ => return Err(crate::Error::OutOfBounds),
    }

    let mut values = Vec::with_capacity(total);
    for _ in 0..total {
        values.push(parser.read_le::<f64>()?);
    }

    Ok(Data::Float { shape, values })
}
