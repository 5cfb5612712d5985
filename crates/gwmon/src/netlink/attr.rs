//! Netlink attribute (rtattr/nlattr) handling.
//!
//! [`AttrIter`] walks an attribute block and yields either a validated
//! `(type, payload)` pair or a [`SkipReason`]. Payload slices are always
//! bounds-checked against the enclosing buffer; a malformed header ends the
//! walk instead of reading past it.

use std::fmt;

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Why the attribute walk stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than [`NLA_HDRLEN`] bytes remained, but more than zero.
    ShortHeader {
        /// Bytes left in the block.
        remaining: usize,
    },
    /// The declared length is smaller than the attribute header.
    LengthTooSmall {
        /// Declared `nla_len`.
        len: u16,
    },
    /// The declared length runs past the end of the block.
    Overrun {
        /// Declared `nla_len`.
        len: u16,
        /// Bytes left in the block.
        remaining: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ShortHeader { remaining } => {
                write!(f, "{} trailing bytes, too short for a header", remaining)
            }
            SkipReason::LengthTooSmall { len } => {
                write!(f, "attribute length {} below header size", len)
            }
            SkipReason::Overrun { len, remaining } => write!(
                f,
                "attribute length {} exceeds {} remaining bytes",
                len, remaining
            ),
        }
    }
}

impl From<SkipReason> for Error {
    fn from(reason: SkipReason) -> Self {
        Error::InvalidAttribute(reason.to_string())
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Yields `Ok((type, payload))` for every well-formed attribute. The first
/// malformed header yields `Err(SkipReason)` and ends the iteration.
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Check if there are no more attributes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate only the well-formed attributes, ignoring why the walk stopped.
    pub fn valid(self) -> impl Iterator<Item = (u16, &'a [u8])> {
        self.map_while(|item| item.ok())
    }

    fn stop(&mut self, reason: SkipReason) -> Option<<Self as Iterator>::Item> {
        self.data = &[];
        Some(Err(reason))
    }
}

impl<'a> Iterator for AttrIter<'a> {
    /// Returns (attribute type, payload data) or why the walk stopped.
    type Item = std::result::Result<(u16, &'a [u8]), SkipReason>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let attr = match NlAttr::from_bytes(self.data) {
            Ok(a) => a,
            Err(_) => {
                let remaining = self.data.len();
                return self.stop(SkipReason::ShortHeader { remaining });
            }
        };

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN {
            return self.stop(SkipReason::LengthTooSmall { len: attr.nla_len });
        }
        if len > self.data.len() {
            let remaining = self.data.len();
            return self.stop(SkipReason::Overrun {
                len: attr.nla_len,
                remaining,
            });
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);

        // Move to next attribute
        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some(Ok((attr.kind(), payload)))
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(Error::InvalidAttribute("truncated u32 attribute".into()));
        }
        Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }
}
