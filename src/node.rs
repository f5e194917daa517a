//! Tree nodes and the arena that owns them.
//!
//! Nodes never hold pointers to each other. Every relation is a [`NodeId`]
//! into a single [`NodeArena`], so deletion-time surgery only rewrites
//! indices and a freed node can be recycled through the free list.

use std::collections::TryReserveError;

/// A 32-bit reference to a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        NodeId(idx as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One of the three child relations of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    Low,
    Equal,
    High,
}

/// A tree node.
#[derive(Clone, Debug)]
pub(crate) enum Node<P> {
    /// An intermediate byte shared by every word below `equal`.
    Branch {
        key: u8,
        low: Option<NodeId>,
        equal: Option<NodeId>,
        high: Option<NodeId>,
    },
    /// End of a stored word. Its key is the sentinel `0`, so nothing can sort
    /// below it and there is no `low` slot; `high` holds longer words that
    /// share the whole prefix.
    Terminal {
        occurrences: u32,
        payload: P,
        high: Option<NodeId>,
    },
}

impl<P> Node<P> {
    #[inline]
    pub(crate) fn branch(key: u8) -> Self {
        debug_assert_ne!(key, 0, "0 is reserved for terminal nodes");
        Node::Branch {
            key,
            low: None,
            equal: None,
            high: None,
        }
    }

    #[inline]
    pub(crate) fn terminal(payload: P) -> Self {
        Node::Terminal {
            occurrences: 1,
            payload,
            high: None,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> u8 {
        match self {
            Node::Branch { key, .. } => *key,
            Node::Terminal { .. } => 0,
        }
    }

    #[inline]
    pub(crate) fn low(&self) -> Option<NodeId> {
        match self {
            Node::Branch { low, .. } => *low,
            Node::Terminal { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn equal(&self) -> Option<NodeId> {
        match self {
            Node::Branch { equal, .. } => *equal,
            Node::Terminal { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn high(&self) -> Option<NodeId> {
        match self {
            Node::Branch { high, .. } | Node::Terminal { high, .. } => *high,
        }
    }

    #[inline]
    pub(crate) fn child(&self, link: Link) -> Option<NodeId> {
        match link {
            Link::Low => self.low(),
            Link::Equal => self.equal(),
            Link::High => self.high(),
        }
    }

    pub(crate) fn set_child(&mut self, link: Link, child: Option<NodeId>) {
        match (self, link) {
            (Node::Branch { low, .. }, Link::Low) => *low = child,
            (Node::Branch { equal, .. }, Link::Equal) => *equal = child,
            (Node::Branch { high, .. }, Link::High) | (Node::Terminal { high, .. }, Link::High) => {
                *high = child
            }
            (Node::Terminal { .. }, link) => {
                debug_assert!(child.is_none(), "terminal node cannot own a {link:?} child")
            }
        }
    }

    /// Whether the node has a `low` or `high` sibling subtree.
    #[inline]
    pub(crate) fn has_sides(&self) -> bool {
        self.low().is_some() || self.high().is_some()
    }

    /// Whether a subtree can be grafted into this node's empty `low` slot.
    #[inline]
    pub(crate) fn accepts_low(&self) -> bool {
        matches!(self, Node::Branch { low: None, .. })
    }

    #[inline]
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal { .. })
    }

    #[inline]
    pub(crate) fn occurrences(&self) -> u32 {
        match self {
            Node::Branch { .. } => 0,
            Node::Terminal { occurrences, .. } => *occurrences,
        }
    }

    #[inline]
    pub(crate) fn payload(&self) -> Option<&P> {
        match self {
            Node::Branch { .. } => None,
            Node::Terminal { payload, .. } => Some(payload),
        }
    }

    pub(crate) fn into_payload(self) -> Option<P> {
        match self {
            Node::Branch { .. } => None,
            Node::Terminal { payload, .. } => Some(payload),
        }
    }
}

/// Slot arena for tree nodes, with a free list of recycled slots.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<P> {
    slots: Vec<Option<Node<P>>>,
    free: Vec<NodeId>,
    live: usize,
}

impl<P> NodeArena<P> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of nodes currently allocated.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Bytes held by the arena itself, excluding payload heap storage.
    pub(crate) fn capacity_bytes(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Node<P>>>()
            + self.free.capacity() * std::mem::size_of::<NodeId>()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing free slots can be dropped outright.
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.index() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    /// Make sure the next `additional` calls to [`alloc`](Self::alloc) will
    /// not need to grow the arena.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let fresh = additional.saturating_sub(self.free.len());
        self.slots.try_reserve(fresh)
    }

    pub(crate) fn alloc(&mut self, node: Node<P>) -> NodeId {
        self.live += 1;
        if let Some(id) = self.free.pop() {
            debug_assert!(self.slots[id.index()].is_none());
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId::new(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Node<P> {
        let node = self.slots[id.index()]
            .take()
            .expect("freed node id must be live");
        self.live -= 1;
        self.free.push(id);
        node
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<P> {
        self.slots[id.index()]
            .as_ref()
            .expect("node id must be live")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<P> {
        self.slots[id.index()]
            .as_mut()
            .expect("node id must be live")
    }

    /// Drop every slot. Only valid once no node id is reachable anymore.
    pub(crate) fn reset(&mut self) {
        debug_assert_eq!(self.live, 0, "reset with live nodes");
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}
