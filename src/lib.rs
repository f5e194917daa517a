//! # tst-rs
//!
//! A ternary search tree over byte strings, built for word lists,
//! autocomplete and spell-check style lookups.
//!
//! Every node holds one byte and three children: `low` and `high` for
//! siblings that sort before and after it, `equal` for the next byte of the
//! words sharing its prefix. The end of a word is a terminal node that
//! carries the word itself and counts how many times it was inserted.
//!
//! Words are stored either as private copies ([`CopyTree`]) or as borrows of
//! the caller's strings ([`RefTree`]); both run the same algorithms.
//!
//! ## Example
//!
//! ```rust
//! use tst_rs::{CopyTree, Removal};
//!
//! let mut tree = CopyTree::new();
//! for word in ["cat", "cats", "car", "dog"] {
//!     tree.insert(word).unwrap();
//! }
//!
//! assert_eq!(tree.search("cat"), Some("cat"));
//! assert_eq!(tree.suggest("ca", 10), Some(vec!["car", "cat", "cats"]));
//!
//! assert!(matches!(tree.remove("cat"), Ok(Removal::Removed(_))));
//! assert_eq!(tree.search("cat"), None);
//! assert_eq!(tree.search("cats"), Some("cats"));
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

mod error;
mod iter;
mod node;
mod payload;
mod remove;
mod stack;

pub use error::{Result, TstError};
pub use iter::Iter;
pub use payload::{Ownership, Payload, Storage};
pub use remove::Removal;

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::node::{Link, Node, NodeArena, NodeId};

// =============================================================================
// Configuration
// =============================================================================

/// Longest word accepted by default, in bytes.
pub const DEFAULT_MAX_WORD_LEN: usize = 127;

/// Longest possible search path for words of up to `max_word_len` bytes.
///
/// Each level holds at most 256 distinct keys, the terminal sentinel
/// included, and a word of `n` bytes crosses `n + 1` levels.
pub const fn max_path_len_for(max_word_len: usize) -> usize {
    max_word_len.saturating_add(1).saturating_mul(256)
}

/// Limits and sizing for a [`TernaryTree`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Longest word accepted by insert and delete, in bytes.
    pub max_word_len: usize,
    /// Most nodes a delete may record on its way down to the terminal.
    /// Sibling hops count: see [`max_path_len_for`].
    pub max_path_len: usize,
    /// Number of nodes to preallocate.
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_word_len: DEFAULT_MAX_WORD_LEN,
            max_path_len: max_path_len_for(DEFAULT_MAX_WORD_LEN),
            initial_capacity: 0,
        }
    }
}

impl Config {
    /// Config accepting words up to `max_word_len` bytes, with the ancestor
    /// stack sized to match.
    pub fn with_max_word_len(max_word_len: usize) -> Self {
        Self {
            max_word_len,
            max_path_len: max_path_len_for(max_word_len),
            ..Self::default()
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

/// A stored word and the number of times it was inserted.
pub struct Entry<'t, P> {
    payload: &'t P,
    occurrences: u32,
}

impl<'t, P: Storage> Entry<'t, P> {
    #[inline]
    pub fn word(&self) -> &'t str {
        self.payload.as_ref()
    }

    #[inline]
    pub fn payload(&self) -> &'t P {
        self.payload
    }

    /// `1` right after the first insert of a word.
    #[inline]
    pub fn occurrences(&self) -> u32 {
        self.occurrences
    }
}

impl<P> Clone for Entry<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Entry<'_, P> {}

impl<P: Storage> fmt::Debug for Entry<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("word", &self.word())
            .field("occurrences", &self.occurrences)
            .finish()
    }
}

// =============================================================================
// TernaryTree
// =============================================================================

/// Byte `i` of a word, with the terminal sentinel past its end.
#[inline]
fn byte_at(word: &[u8], i: usize) -> u8 {
    word.get(i).copied().unwrap_or(0)
}

/// A ternary search tree of words.
///
/// `P` picks how words are held: `Box<str>` copies them ([`CopyTree`]),
/// `&'a str` borrows them ([`RefTree`]).
#[derive(Clone)]
pub struct TernaryTree<P = Box<str>> {
    nodes: NodeArena<P>,
    root: Option<NodeId>,
    /// Distinct words stored.
    count: usize,
    config: Config,
}

/// Tree that owns a private copy of every word.
pub type CopyTree = TernaryTree<Box<str>>;

/// Tree that borrows every word from the caller.
pub type RefTree<'a> = TernaryTree<&'a str>;

impl<P> TernaryTree<P> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            nodes: NodeArena::with_capacity(config.initial_capacity),
            root: None,
            count: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of distinct words stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of nodes in the tree, terminals included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    /// Release arena slack left behind by deletions.
    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Free every node, children before parents, and every owned payload.
    /// Borrowed payloads are left alone. Returns the number of nodes freed.
    pub fn clear(&mut self) -> usize {
        let mut freed = 0;
        // Post-order: a node is freed on its second visit, once its children
        // have been pushed and freed.
        let mut stack: Vec<(NodeId, bool)> = Vec::new();
        if let Some(root) = self.root.take() {
            stack.push((root, false));
        }
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                drop(self.nodes.free(id));
                freed += 1;
                continue;
            }
            stack.push((id, true));
            let node = self.nodes.get(id);
            for child in [node.high(), node.equal(), node.low()].into_iter().flatten() {
                stack.push((child, false));
            }
        }
        trace!(freed, "cleared tree");
        self.nodes.reset();
        self.count = 0;
        freed
    }

    fn validate<'a>(&self, word: &'a str) -> Result<&'a [u8]> {
        let bytes = word.as_bytes();
        if bytes.is_empty() {
            return Err(TstError::EmptyWord);
        }
        if bytes.len() > self.config.max_word_len {
            return Err(TstError::WordTooLong {
                len: bytes.len(),
                max: self.config.max_word_len,
            });
        }
        if let Some(offset) = bytes.iter().position(|&b| b == 0) {
            return Err(TstError::NulByte { offset });
        }
        Ok(bytes)
    }

    /// Point whichever slot `parent` designates at `child`; `None` is the root.
    fn relink(&mut self, parent: Option<(NodeId, Link)>, child: Option<NodeId>) {
        match parent {
            Some((node, link)) => self.nodes.get_mut(node).set_child(link, child),
            None => self.root = child,
        }
    }

    /// Terminal node of `word`, if stored.
    fn find_terminal(&self, word: &[u8]) -> Option<NodeId> {
        if word.is_empty() {
            return None;
        }
        let mut current = self.root;
        let mut i = 0;
        while let Some(id) = current {
            let node = self.nodes.get(id);
            let c = byte_at(word, i);
            current = match c.cmp(&node.key()) {
                Ordering::Less => node.low(),
                Ordering::Greater => node.high(),
                // A NUL inside the query must not match a shorter word.
                Ordering::Equal if c == 0 => return (i == word.len()).then_some(id),
                Ordering::Equal => {
                    i += 1;
                    node.equal()
                }
            };
        }
        None
    }

    fn entry(&self, id: NodeId) -> Entry<'_, P> {
        let node = self.nodes.get(id);
        Entry {
            payload: node.payload().expect("entry of a terminal node"),
            occurrences: node.occurrences(),
        }
    }
}

impl<P: Storage> TernaryTree<P> {
    /// Insert `word`, or count one more occurrence of it.
    ///
    /// Returns the stored entry: a fresh word reports one occurrence, a
    /// duplicate reports its new count and the payload stored the first time.
    /// On error nothing is changed.
    pub fn insert<'w>(&mut self, word: &'w str) -> Result<Entry<'_, P>>
    where
        P: Payload<'w>,
    {
        let bytes = self.validate(word)?;

        let mut parent: Option<(NodeId, Link)> = None;
        let mut current = self.root;
        let mut i = 0;
        while let Some(id) = current {
            let node = self.nodes.get(id);
            let c = byte_at(bytes, i);
            let link = match c.cmp(&node.key()) {
                Ordering::Less => Link::Low,
                Ordering::Greater => Link::High,
                Ordering::Equal if c == 0 => {
                    if let Node::Terminal { occurrences, .. } = self.nodes.get_mut(id) {
                        *occurrences = occurrences
                            .checked_add(1)
                            .ok_or(TstError::TooManyOccurrences)?;
                        trace!(word, occurrences = *occurrences, "duplicate insert");
                    }
                    return Ok(self.entry(id));
                }
                Ordering::Equal => {
                    i += 1;
                    Link::Equal
                }
            };
            parent = Some((id, link));
            current = node.child(link);
        }

        // Everything that can fail happens before the first node is linked in:
        // one node per remaining byte plus the terminal.
        self.nodes.reserve(bytes.len() - i + 1)?;
        let payload = P::adopt(word)?;

        for &c in &bytes[i..] {
            let id = self.nodes.alloc(Node::branch(c));
            self.relink(parent, Some(id));
            parent = Some((id, Link::Equal));
        }
        let terminal = self.nodes.alloc(Node::terminal(payload));
        self.relink(parent, Some(terminal));
        self.count += 1;
        let ownership = P::OWNERSHIP;
        trace!(word, new_nodes = bytes.len() - i + 1, %ownership, "inserted");

        Ok(self.entry(terminal))
    }

    /// The stored payload equal to `word`.
    pub fn search(&self, word: &str) -> Option<&str> {
        self.get(word).map(|entry| entry.word())
    }

    pub fn get(&self, word: &str) -> Option<Entry<'_, P>> {
        self.find_terminal(word.as_bytes()).map(|id| self.entry(id))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.find_terminal(word.as_bytes()).is_some()
    }

    /// How many times `word` is currently stored; `0` if absent.
    pub fn occurrences(&self, word: &str) -> u32 {
        self.get(word).map_or(0, |entry| entry.occurrences())
    }

    /// Approximate bytes used: the node arena plus heap storage of owned
    /// payloads.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity_bytes()
            + self
                .iter()
                .map(|entry| entry.payload().heap_bytes())
                .sum::<usize>()
    }
}

impl<P> Default for TernaryTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Storage> fmt::Debug for TernaryTree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|e| (e.word(), e.occurrences())))
            .finish()
    }
}


#[cfg(test)]
mod proptests;
