//! Payload ownership strategies.
//!
//! A terminal node stores its word either as a private copy or as a borrow of
//! the caller's string. The tree is generic over the payload type, so the
//! strategy is picked at the type level:
//!
//! - `Box<str>`: copy mode. The tree allocates and owns each word.
//! - `&'a str`: reference mode. The tree never copies or frees; the borrow
//!   checker keeps the caller's strings alive for as long as the tree.

use std::collections::TryReserveError;
use std::fmt;

/// Who owns the storage behind a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    Copy,
    Reference,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ownership::Copy => "copy",
            Ownership::Reference => "reference",
        })
    }
}

/// A word as stored in a terminal node.
pub trait Storage: AsRef<str> {
    const OWNERSHIP: Ownership;

    /// Heap bytes owned by this payload.
    fn heap_bytes(&self) -> usize;
}

/// Builds a payload from a word being inserted. `'w` is the lifetime of the
/// caller's string.
pub trait Payload<'w>: Storage + Sized {
    fn adopt(word: &'w str) -> Result<Self, TryReserveError>;
}

impl Storage for Box<str> {
    const OWNERSHIP: Ownership = Ownership::Copy;

    #[inline]
    fn heap_bytes(&self) -> usize {
        self.len()
    }
}

impl<'w> Payload<'w> for Box<str> {
    fn adopt(word: &'w str) -> Result<Self, TryReserveError> {
        let mut owned = String::new();
        owned.try_reserve_exact(word.len())?;
        owned.push_str(word);
        Ok(owned.into_boxed_str())
    }
}

impl Storage for &str {
    const OWNERSHIP: Ownership = Ownership::Reference;

    #[inline]
    fn heap_bytes(&self) -> usize {
        0
    }
}

impl<'a> Payload<'a> for &'a str {
    #[inline]
    fn adopt(word: &'a str) -> Result<Self, TryReserveError> {
        Ok(word)
    }
}
