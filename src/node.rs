//! Chain nodes and their arena.
//!
//! Every bin heads a chain that ends in exactly one `Sentinel`. A real node
//! always links to a successor (another real node or the sentinel), so the
//! "no next element" case is a tag on the node rather than a missing link.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational key of a node in a table's arena.
    pub(crate) struct NodeKey;
}

/// Anything stored in a table: exposes the key it is hashed and compared by.
pub trait Keyed {
    type Key: Eq;
    fn key(&self) -> &Self::Key;
}

#[derive(Clone, Debug)]
pub(crate) enum Node<E> {
    Sentinel,
    Entry { value: E, next: NodeKey },
}

impl<E> Node<E> {
    #[inline]
    pub(crate) fn is_sentinel(&self) -> bool {
        matches!(self, Node::Sentinel)
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<NodeKey> {
        match self {
            Node::Sentinel => None,
            Node::Entry { next, .. } => Some(*next),
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&E> {
        match self {
            Node::Sentinel => None,
            Node::Entry { value, .. } => Some(value),
        }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> Option<&mut E> {
        match self {
            Node::Sentinel => None,
            Node::Entry { value, .. } => Some(value),
        }
    }

    /// Value of a node known to be real.
    #[inline]
    pub(crate) fn entry(&self) -> &E {
        self.value().expect("chain node must not be a sentinel here")
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> &mut E {
        self.value_mut()
            .expect("chain node must not be a sentinel here")
    }

    /// Relink a real node. Sentinels have no link and are left untouched.
    #[inline]
    pub(crate) fn set_next(&mut self, to: NodeKey) {
        if let Node::Entry { next, .. } = self {
            *next = to;
        }
    }

    pub(crate) fn into_entry(self) -> Option<(E, NodeKey)> {
        match self {
            Node::Sentinel => None,
            Node::Entry { value, next } => Some((value, next)),
        }
    }
}

/// Node storage shared by all chains of one table.
pub(crate) type Arena<E> = SlotMap<NodeKey, Node<E>>;
