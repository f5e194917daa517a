//! Bounded record of the path walked during deletion.

use smallvec::SmallVec;

use crate::error::{Result, TstError};
use crate::node::{Link, NodeId};

/// Frames kept inline before spilling to the heap. Covers typical
/// dictionary words without allocating.
const INLINE_FRAMES: usize = 64;

/// A visited node and the link followed out of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) node: NodeId,
    pub(crate) link: Link,
}

/// LIFO of [`Frame`]s from the root down to the node being deleted.
///
/// Pushing beyond `bound` fails instead of growing, so a delete never walks
/// further than the configured maximum path.
#[derive(Debug)]
pub(crate) struct AncestorStack {
    frames: SmallVec<[Frame; INLINE_FRAMES]>,
    bound: usize,
}

impl AncestorStack {
    pub(crate) fn with_bound(bound: usize) -> Self {
        Self {
            frames: SmallVec::new(),
            bound,
        }
    }

    pub(crate) fn push(&mut self, node: NodeId, link: Link) -> Result<()> {
        if self.frames.len() >= self.bound {
            return Err(TstError::PathTooDeep { bound: self.bound });
        }
        self.frames.push(Frame { node, link });
        Ok(())
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Frames from the root (index 0) to the most recent push.
    #[inline]
    pub(crate) fn frames(&self) -> &[Frame] {
        &self.frames
    }
}
