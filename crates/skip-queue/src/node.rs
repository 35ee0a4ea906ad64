use std::ops::{Index, IndexMut};

use crate::error::QueueError;


/// A stable handle to a [`Node`] stored in a [`NodeArena`].
///
/// Handles are only created by [`NodeArena::alloc`]; a handle stays valid until it is passed to
/// [`NodeArena::free`], after which its slot may be reused by another node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub(crate) struct NodeId(usize);

pub(crate) type Link = Option<NodeId>;


/// One stored key on one level of the queue.
///
/// The vertical stack of nodes sharing a key represents one logical entry. Only the bottom node
/// of the stack (the one on level 0) owns the entry's value; every node above it refers back to
/// that node through `base`, so a value update made through any node of the stack is observed by
/// all of them.
#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    key:   f64,
    /// `Some` only for the bottom node of an entry. Always `None` for sentinels and for nodes
    /// produced by [`Node::index_copy`].
    value: Option<V>,
    /// The bottom node of this node's vertical stack, or `None` if this node is that bottom node
    /// (or a sentinel).
    base:  Link,
    prev:  Link,
    next:  Link,
    above: Link,
    below: Link,
}

#[expect(unreachable_pub, reason = "control Node's visibility from one site, its definition")]
impl<V> Node<V> {
    /// Create an unlinked node which owns `value`.
    ///
    /// # Errors
    /// Returns [`QueueError::KeyNotANumber`] if `key` is `NaN`.
    pub fn entry(key: f64, value: V) -> Result<Self, QueueError> {
        if key.is_nan() {
            return Err(QueueError::KeyNotANumber);
        }

        Ok(Self {
            key,
            value: Some(value),
            base:  None,
            prev:  None,
            next:  None,
            above: None,
            below: None,
        })
    }

    /// Create an unlinked boundary node. Sentinels are the only nodes whose keys are infinite.
    #[must_use]
    pub const fn sentinel(key: f64) -> Self {
        debug_assert!(key.is_infinite(), "sentinel keys are infinite");

        Self {
            key,
            value: None,
            base:  None,
            prev:  None,
            next:  None,
            above: None,
            below: None,
        }
    }

    /// Copy the key of `self` (but none of its links) into a node for a higher level, whose
    /// value resolves to `base`.
    #[must_use]
    pub const fn index_copy(&self, base: NodeId) -> Self {
        Self {
            key:   self.key,
            value: None,
            base:  Some(base),
            prev:  None,
            next:  None,
            above: None,
            below: None,
        }
    }

    /// Consume the node, returning the value it owns (if any).
    #[inline]
    #[must_use]
    #[cfg_attr(not(test), allow(dead_code, reason = "used by the scanning ops of `Level`"))]
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> f64 {
        self.key
    }

    #[inline]
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.key.is_infinite()
    }

    #[inline]
    #[must_use]
    pub const fn prev(&self) -> Link {
        self.prev
    }

    #[inline]
    #[must_use]
    pub const fn next(&self) -> Link {
        self.next
    }

    #[inline]
    #[must_use]
    pub const fn above(&self) -> Link {
        self.above
    }

    #[inline]
    #[must_use]
    pub const fn below(&self) -> Link {
        self.below
    }
}

/// Owner of every node of a queue, including the sentinels of each level.
///
/// All links between nodes are [`NodeId`] handles into the arena, so unlinking and relinking
/// nodes never involves ownership. Freed slots are recycled by later allocations.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<V> {
    nodes: Vec<Node<V>>,
    free:  Vec<NodeId>,
}

impl<V> Default for NodeArena<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[expect(unreachable_pub, reason = "control NodeArena's visibility from one site, its definition")]
impl<V> NodeArena<V> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free:  Vec::new(),
        }
    }

    /// Move `node` into the arena, reusing a freed slot if one is available.
    pub fn alloc(&mut self, node: Node<V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self[id] = node;
            id
        } else {
            let id = NodeId(self.nodes.len());
            self.nodes.push(node);
            id
        }
    }

    /// Release the slot of a node which has already been unlinked, returning the value it owned
    /// (if any).
    ///
    /// The handle must not be used again unless it is handed out anew by [`alloc`].
    ///
    /// [`alloc`]: NodeArena::alloc
    pub fn free(&mut self, id: NodeId) -> Option<V> {
        let node = &mut self[id];
        debug_assert!(
            node.prev.is_none() && node.next.is_none()
                && node.above.is_none() && node.below.is_none(),
            "a node must be unlinked before it is freed",
        );
        debug_assert!(!node.key.is_nan(), "double free of a queue node");

        node.key = f64::NAN;
        node.base = None;
        let value = node.value.take();
        self.free.push(id);
        value
    }

    /// The number of nodes currently allocated, sentinels included.
    #[must_use]
    #[cfg_attr(not(test), allow(dead_code, reason = "leak checks in tests"))]
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    #[inline]
    #[must_use]
    pub fn key(&self, id: NodeId) -> f64 {
        self[id].key()
    }

    /// Link `left` and `right` as horizontal neighbours (`left.next == right`).
    pub fn link_horizontal(&mut self, left: NodeId, right: NodeId) {
        self[left].next = Some(right);
        self[right].prev = Some(left);
    }

    /// Link `lower` and `upper` as vertical neighbours (`lower.above == upper`).
    pub fn link_vertical(&mut self, lower: NodeId, upper: NodeId) {
        self[lower].above = Some(upper);
        self[upper].below = Some(lower);
    }

    /// Detach `id` from all four of its neighbour slots, repairing the neighbours' links so that
    /// its level stays a consistent doubly-linked list and no node keeps a vertical link to it.
    pub fn unlink(&mut self, id: NodeId) {
        let Node { prev, next, above, below, .. } = self[id];

        match (prev, next) {
            (Some(prev), Some(next)) => self.link_horizontal(prev, next),
            (Some(prev), None)       => self[prev].next = None,
            (None, Some(next))       => self[next].prev = None,
            (None, None)             => {}
        }
        if let Some(above) = above {
            self[above].below = None;
        }
        if let Some(below) = below {
            self[below].above = None;
        }

        let node = &mut self[id];
        node.prev = None;
        node.next = None;
        node.above = None;
        node.below = None;
    }

    /// The bottom node of `id`'s vertical stack, which owns the entry's value.
    #[inline]
    #[must_use]
    pub fn base(&self, id: NodeId) -> NodeId {
        self[id].base.unwrap_or(id)
    }

    /// The value of the entry `id` belongs to, or `None` for sentinels.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&V> {
        self[self.base(id)].value.as_ref()
    }

    #[must_use]
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        let base = self.base(id);
        self[base].value.as_mut()
    }

    /// Replace the value of the entry `id` belongs to, so that every node sharing its key
    /// observes the new value. Returns the previous value.
    ///
    /// Sentinels own no value; updating one stores nothing and returns `None`.
    pub fn update_value(&mut self, id: NodeId, value: V) -> Option<V> {
        let base = self.base(id);
        let slot = &mut self[base].value;
        if slot.is_some() {
            slot.replace(value)
        } else {
            None
        }
    }

    /// Follow `below` links down to the level-0 node with the same key.
    #[must_use]
    pub fn bottom_of(&self, mut id: NodeId) -> NodeId {
        while let Some(below) = self[id].below {
            id = below;
        }
        id
    }

    /// Follow `above` links up to the highest node with the same key, and return it along with
    /// the number of levels above `id` that it is.
    #[must_use]
    pub fn top_of(&self, mut id: NodeId) -> (NodeId, usize) {
        let mut climbed = 0;
        while let Some(above) = self[id].above {
            id = above;
            climbed += 1;
        }
        (id, climbed)
    }
}

impl<V> Index<NodeId> for NodeArena<V> {
    type Output = Node<V>;

    #[inline]
    #[expect(clippy::indexing_slicing, reason = "handles are only created by `alloc`")]
    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl<V> IndexMut<NodeId> for NodeArena<V> {
    #[inline]
    #[expect(clippy::indexing_slicing, reason = "handles are only created by `alloc`")]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    fn chain(arena: &mut NodeArena<&'static str>, keys: &[f64]) -> Vec<NodeId> {
        let ids: Vec<NodeId> = keys
            .iter()
            .map(|&key| arena.alloc(Node::entry(key, "v").unwrap()))
            .collect();
        for pair in ids.windows(2) {
            arena.link_horizontal(pair[0], pair[1]);
        }
        ids
    }

    #[test]
    fn nan_keys_are_rejected() {
        assert_eq!(Node::entry(f64::NAN, ()).unwrap_err(), QueueError::KeyNotANumber);
        assert!(Node::entry(1.5, ()).is_ok());
    }

    #[test]
    fn sentinels_and_copies() {
        let head: Node<u8> = Node::sentinel(f64::NEG_INFINITY);
        assert!(head.is_sentinel());

        let mut arena = NodeArena::new();
        let entry = arena.alloc(Node::entry(4., 'x').unwrap());
        let copy = arena[entry].index_copy(entry);
        assert_eq!(copy.key(), 4.);
        assert!(!copy.is_sentinel());
        assert!(copy.prev().is_none() && copy.next().is_none());

        let copy = arena.alloc(copy);
        assert_eq!(arena.base(copy), entry);
        assert_eq!(arena.value(copy), Some(&'x'));
    }

    #[test]
    fn unlink_repairs_horizontal_neighbours() {
        let mut arena = NodeArena::new();
        let ids = chain(&mut arena, &[1., 2., 3.]);

        arena.unlink(ids[1]);

        assert_eq!(arena[ids[0]].next(), Some(ids[2]));
        assert_eq!(arena[ids[2]].prev(), Some(ids[0]));
        assert!(arena[ids[1]].prev().is_none());
        assert!(arena[ids[1]].next().is_none());

        arena.unlink(ids[2]);
        assert!(arena[ids[0]].next().is_none());
    }

    #[test]
    fn unlink_repairs_vertical_neighbours() {
        let mut arena = NodeArena::new();
        let bottom = arena.alloc(Node::entry(1., "v").unwrap());
        let middle = arena.alloc(arena[bottom].index_copy(bottom));
        let top = arena.alloc(arena[bottom].index_copy(bottom));
        arena.link_vertical(bottom, middle);
        arena.link_vertical(middle, top);

        assert_eq!(arena.top_of(bottom), (top, 2));
        assert_eq!(arena.bottom_of(top), bottom);

        arena.unlink(middle);
        assert!(arena[bottom].above().is_none());
        assert!(arena[top].below().is_none());
    }

    #[test]
    fn update_propagates_through_the_stack() {
        let mut arena = NodeArena::new();
        let bottom = arena.alloc(Node::entry(1., 10).unwrap());
        let upper = arena.alloc(arena[bottom].index_copy(bottom));
        arena.link_vertical(bottom, upper);

        assert_eq!(arena.update_value(upper, 20), Some(10));
        assert_eq!(arena.value(bottom), Some(&20));
        assert_eq!(arena.value(upper), Some(&20));

        *arena.value_mut(bottom).unwrap() += 1;
        assert_eq!(arena.value(upper), Some(&21));

        let sentinel = arena.alloc(Node::sentinel(f64::INFINITY));
        assert_eq!(arena.update_value(sentinel, 5), None);
        assert_eq!(arena.value(sentinel), None);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = NodeArena::new();
        let ids = chain(&mut arena, &[1., 2.]);
        assert_eq!(arena.live_nodes(), 2);

        arena.unlink(ids[0]);
        assert_eq!(arena.free(ids[0]), Some("v"));
        assert_eq!(arena.live_nodes(), 1);

        let reused = arena.alloc(Node::entry(7., "w").unwrap());
        assert_eq!(reused, ids[0]);
        assert_eq!(arena.key(reused), 7.);
        assert_eq!(arena.live_nodes(), 2);
    }
}
