//! Parser trait for strongly-typed netlink payloads.
//!
//! Payload decoders implement [`FromNetlink`] on top of winnow combinators.
//!
//! # Example
//!
//! ```ignore
//! use gwmon::netlink::{FromNetlink, RouteSelector};
//!
//! let selector = RouteSelector::from_bytes(payload)?;
//! ```

use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Trait for types that can be parsed from netlink wire format.
pub trait FromNetlink: Sized {
    /// Parse from a mutable byte slice reference.
    /// The slice is advanced past the consumed bytes.
    fn parse(input: &mut &[u8]) -> PResult<Self>;

    /// Parse from a complete byte slice.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse
            .parse(data)
            .map_err(|e| Error::Parse(format!("{}", e)))
    }
}

/// A hard parse failure that stops the current record.
pub fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use winnow::binary::le_u16;

    #[derive(Debug, PartialEq)]
    struct Pair(u16, u16);

    impl FromNetlink for Pair {
        fn parse(input: &mut &[u8]) -> PResult<Self> {
            let a = le_u16.parse_next(input)?;
            let b = le_u16.parse_next(input)?;
            Ok(Pair(a, b))
        }
    }

    #[test]
    fn test_from_bytes_complete() {
        assert_eq!(Pair::from_bytes(&[1, 0, 2, 0]).unwrap(), Pair(1, 2));
    }

    #[test]
    fn test_from_bytes_rejects_short_input() {
        let err = Pair::from_bytes(&[1, 0, 2]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_from_bytes_rejects_trailing_input() {
        assert!(Pair::from_bytes(&[1, 0, 2, 0, 9]).is_err());
    }
}
