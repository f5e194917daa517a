use std::collections::TryReserveError;

use thiserror::Error;

pub type Result<T, E = TstError> = std::result::Result<T, E>;

/// Errors reported by tree mutations.
///
/// Every error leaves the tree in the state it had before the failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TstError {
    #[error("word is empty")]
    EmptyWord,
    #[error("word is {len} bytes long, the limit is {max}")]
    WordTooLong { len: usize, max: usize },
    /// NUL is the terminal sentinel and cannot be part of a word.
    #[error("word contains a NUL byte at offset {offset}")]
    NulByte { offset: usize },
    #[error("search path is deeper than the ancestor stack bound of {bound}")]
    PathTooDeep { bound: usize },
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    #[error("occurrence count overflowed")]
    TooManyOccurrences,
    /// Both children of the node that has to be spliced out already hold a
    /// subtree on the side a rotation would need.
    #[error("cannot splice out node {key:?}: neither child can be rotated into its place")]
    Unrotatable { key: char },
}
