//! In-order enumeration: full traversal and prefix suggestions.

use std::cmp::Ordering;

use crate::node::{Node, NodeId};
use crate::{Entry, Storage, TernaryTree};

#[derive(Clone, Copy)]
enum Visit {
    /// Expand the subtree rooted here.
    Subtree(NodeId),
    /// Yield this terminal.
    Emit(NodeId),
}

/// Iterator over stored words in ascending byte order.
///
/// Walks `low`, then `equal` (or the terminal itself), then `high`, using an
/// explicit stack rather than recursion.
pub struct Iter<'t, P> {
    tree: &'t TernaryTree<P>,
    stack: Vec<Visit>,
}

impl<'t, P> Iter<'t, P> {
    fn rooted(tree: &'t TernaryTree<P>, root: Option<NodeId>) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = root {
            stack.push(Visit::Subtree(root));
        }
        Self { tree, stack }
    }
}

impl<'t, P: Storage> Iterator for Iter<'t, P> {
    type Item = Entry<'t, P>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(visit) = self.stack.pop() {
            let id = match visit {
                Visit::Emit(id) => return Some(self.tree.entry(id)),
                Visit::Subtree(id) => id,
            };
            // Pushed in reverse so `low` comes off first.
            match self.tree.nodes.get(id) {
                Node::Branch {
                    low, equal, high, ..
                } => {
                    self.stack.extend(high.map(Visit::Subtree));
                    self.stack.extend(equal.map(Visit::Subtree));
                    self.stack.extend(low.map(Visit::Subtree));
                }
                Node::Terminal { high, .. } => {
                    self.stack.extend(high.map(Visit::Subtree));
                    self.stack.push(Visit::Emit(id));
                }
            }
        }
        None
    }
}

impl<P: Storage> TernaryTree<P> {
    pub fn iter(&self) -> Iter<'_, P> {
        Iter::rooted(self, self.root)
    }

    /// Call `visit` on every stored word in ascending order.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(Entry<'_, P>),
    {
        for entry in self.iter() {
            visit(entry);
        }
    }

    /// Words starting with `prefix`, in ascending order.
    ///
    /// `None` when `prefix` is empty or no stored word starts with it.
    pub fn iter_prefix(&self, prefix: &str) -> Option<Iter<'_, P>> {
        let prefix = prefix.as_bytes();
        let (&last, _) = prefix.split_last()?;
        if last == 0 {
            return None;
        }

        let mut current = self.root;
        let mut i = 0;
        while let Some(id) = current {
            let node = self.nodes.get(id);
            let c = prefix[i];
            current = match c.cmp(&node.key()) {
                Ordering::Less => node.low(),
                Ordering::Greater => node.high(),
                // Found the node of the prefix's last byte: every word through
                // its `equal` slot carries the prefix, its siblings do not.
                Ordering::Equal if i == prefix.len() - 1 => {
                    return Some(Iter::rooted(self, node.equal()));
                }
                Ordering::Equal => {
                    i += 1;
                    node.equal()
                }
            };
        }
        None
    }

    /// Up to `max` words starting with `prefix`, in ascending order.
    ///
    /// A result of exactly `max` words may have been cut short. `None` when
    /// `prefix` is empty or no stored word starts with it.
    pub fn suggest(&self, prefix: &str, max: usize) -> Option<Vec<&str>> {
        let words = self.iter_prefix(prefix)?;
        Some(words.take(max).map(|entry| entry.word()).collect())
    }
}

impl<'t, P: Storage> IntoIterator for &'t TernaryTree<P> {
    type Item = Entry<'t, P>;
    type IntoIter = Iter<'t, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
