//! Deletion: occurrence counting and structural removal.
//!
//! Removing the last occurrence of a word takes out its terminal node and
//! every node that only existed for that word, then repairs the tree locally:
//!
//! 1. Walk up the unique suffix chain, where neither the victim nor its parent
//!    has a `low`/`high` sibling. If the chain reaches the root, the tree was
//!    holding just this word.
//! 2. Splice out the victim by its side children: promote a child through a
//!    rotation when it has two, promote the child when it has one, detach it
//!    when it has none. Detaching from a parent's `equal` slot leaves the
//!    parent without its middle subtree, so the parent is spliced out the
//!    same way one level up.
//!
//! The repair is planned against the untouched tree first. A node whose two
//! children both already hold a subtree on the side a rotation needs cannot be
//! spliced out this way; the plan fails and nothing is modified.

use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::{Result, TstError};
use crate::node::{Link, Node, NodeId};
use crate::stack::{AncestorStack, Frame};
use crate::{byte_at, Entry, Storage, TernaryTree};

/// Outcome of [`TernaryTree::remove`].
pub enum Removal<'t, P> {
    /// The word had further occurrences; its count went down by one.
    Retained(Entry<'t, P>),
    /// The last occurrence is gone. The tree hands back the payload it held.
    Removed(P),
    /// The word is not stored.
    NotFound,
}

impl<P: Storage> fmt::Debug for Removal<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Removal::Retained(entry) => f.debug_tuple("Retained").field(entry).finish(),
            Removal::Removed(payload) => f.debug_tuple("Removed").field(&payload.as_ref()).finish(),
            Removal::NotFound => f.write_str("NotFound"),
        }
    }
}

/// How a node with nothing left in its `equal` slot leaves the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Splice {
    /// `low` has no `high`: `high` moves under it and `low` takes the place.
    PromoteLow { low: NodeId, high: NodeId },
    /// `high` has no `low`: `low` moves under it and `high` takes the place.
    PromoteHigh { low: NodeId, high: NodeId },
    /// The only side child takes the place.
    Replace(NodeId),
    /// No children; the slot is cleared.
    Detach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plan {
    /// The word was the only one in the tree.
    Empty,
    /// Free the chain from `depth` down and splice its top node out of the
    /// slot recorded at `depth - 1` (the root when `depth` is 0).
    Splice { depth: usize, splice: Splice },
    /// Free the chain from `depth` down, then free its parent as well and
    /// splice the parent out of the slot recorded at `depth - 2`.
    Collapse { depth: usize, splice: Splice },
}

impl<P> TernaryTree<P> {
    fn plan_splice(&self, victim: NodeId) -> Result<Splice> {
        let node = self.nodes.get(victim);
        match (node.low(), node.high()) {
            (Some(low), Some(high)) => {
                if self.nodes.get(low).high().is_none() {
                    Ok(Splice::PromoteLow { low, high })
                } else if self.nodes.get(high).accepts_low() {
                    Ok(Splice::PromoteHigh { low, high })
                } else {
                    Err(TstError::Unrotatable {
                        key: char::from(node.key()),
                    })
                }
            }
            (Some(child), None) | (None, Some(child)) => Ok(Splice::Replace(child)),
            (None, None) => Ok(Splice::Detach),
        }
    }

    /// Work out the repair for removing `terminal`, whose ancestors are
    /// `frames`, without touching anything.
    fn plan_removal(&self, terminal: NodeId, frames: &[Frame]) -> Result<Plan> {
        let mut victim = terminal;
        let mut depth = frames.len();

        // Unique suffix chain.
        while depth > 0 {
            let parent = frames[depth - 1].node;
            if self.nodes.get(parent).has_sides() || self.nodes.get(victim).has_sides() {
                break;
            }
            victim = parent;
            depth -= 1;
        }

        if depth == 0 && !self.nodes.get(victim).has_sides() {
            return Ok(Plan::Empty);
        }

        let splice = self.plan_splice(victim)?;
        if splice == Splice::Detach && frames[depth - 1].link == Link::Equal {
            // The chain stopped because the parent branches, so it keeps at
            // least one side child and never detaches itself.
            let parent = frames[depth - 1].node;
            let splice = self.plan_splice(parent)?;
            debug_assert_ne!(splice, Splice::Detach);
            return Ok(Plan::Collapse { depth, splice });
        }
        Ok(Plan::Splice { depth, splice })
    }

    /// Carry out a [`Splice`] for a node hanging off `parent`.
    fn apply_splice(&mut self, parent: Option<Frame>, splice: Splice) {
        let replacement = match splice {
            Splice::PromoteLow { low, high } => {
                self.nodes.get_mut(low).set_child(Link::High, Some(high));
                Some(low)
            }
            Splice::PromoteHigh { low, high } => {
                self.nodes.get_mut(high).set_child(Link::Low, Some(low));
                Some(high)
            }
            Splice::Replace(child) => Some(child),
            Splice::Detach => None,
        };
        debug!(?splice, root = parent.is_none(), "spliced node out");
        self.relink(parent.map(|f| (f.node, f.link)), replacement);
    }

    /// Free `terminal` and the chain above it as laid out in `plan`, returning
    /// the terminal's payload.
    fn commit_removal(&mut self, terminal: NodeId, mut stack: AncestorStack, plan: Plan) -> P {
        let payload = self
            .nodes
            .free(terminal)
            .into_payload()
            .expect("removal starts at a terminal node");

        let depth = match plan {
            Plan::Empty => 0,
            Plan::Splice { depth, .. } | Plan::Collapse { depth, .. } => depth,
        };
        while stack.len() > depth {
            let frame = stack.pop().expect("stack holds the chain");
            drop(self.nodes.free(frame.node));
        }

        match plan {
            Plan::Empty => {
                debug!("removed last word");
                self.root = None;
            }
            Plan::Splice { splice, .. } => {
                let parent = stack.pop();
                self.apply_splice(parent, splice);
            }
            Plan::Collapse { splice, .. } => {
                let parent = stack.pop().expect("collapse has a parent frame");
                drop(self.nodes.free(parent.node));
                let grandparent = stack.pop();
                self.apply_splice(grandparent, splice);
            }
        }
        self.count -= 1;
        payload
    }
}

impl<P: Storage> TernaryTree<P> {
    /// Remove one occurrence of `word`.
    ///
    /// While other occurrences remain only the count goes down. The last one
    /// takes the word out of the tree and returns its payload. Fails without
    /// changing anything if the word is invalid, if the path to it is deeper
    /// than [`Config::max_path_len`](crate::Config::max_path_len), or if its
    /// removal would need a rotation that is not possible here
    /// ([`TstError::Unrotatable`]).
    pub fn remove(&mut self, word: &str) -> Result<Removal<'_, P>> {
        let bytes = self.validate(word)?;

        let mut stack = AncestorStack::with_bound(self.config.max_path_len);
        let mut current = self.root;
        let mut i = 0;
        let terminal = loop {
            let Some(id) = current else {
                trace!(word, "remove of missing word");
                return Ok(Removal::NotFound);
            };
            let node = self.nodes.get(id);
            let c = byte_at(bytes, i);
            let link = match c.cmp(&node.key()) {
                Ordering::Less => Link::Low,
                Ordering::Greater => Link::High,
                Ordering::Equal if c == 0 => break id,
                Ordering::Equal => {
                    i += 1;
                    Link::Equal
                }
            };
            stack.push(id, link)?;
            current = node.child(link);
        };
        debug_assert!(self.nodes.get(terminal).is_terminal());

        if let Node::Terminal { occurrences, .. } = self.nodes.get_mut(terminal) {
            if *occurrences > 1 {
                *occurrences -= 1;
                trace!(word, occurrences = *occurrences, "dropped one occurrence");
                return Ok(Removal::Retained(self.entry(terminal)));
            }
        }

        let plan = match self.plan_removal(terminal, stack.frames()) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(word, %err, "word not removed");
                return Err(err);
            }
        };
        trace!(word, ?plan, "removing word");
        Ok(Removal::Removed(self.commit_removal(terminal, stack, plan)))
    }
}
