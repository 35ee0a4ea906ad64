use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::QueueError;
use crate::node::{Link, Node, NodeArena, NodeId};


/// One horizontal list of a skip queue: a sorted doubly-linked list of nodes between a `-inf`
/// head sentinel and a `+inf` tail sentinel.
///
/// A `Level` owns its sentinels, but the nodes themselves live in a [`NodeArena`] which must be
/// passed to every operation; the same arena must be used for the whole life of the level.
/// Vertical links are maintained by the skip queue, not by the level.
///
/// The scanning operations here (`add`, `get`, `remove`) are `O(len)`; a skip queue only uses
/// them on standalone levels, relying on its own descending search otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Level {
    head: NodeId,
    tail: NodeId,
    len:  usize,
}

#[expect(unreachable_pub, reason = "control Level's visibility from one site, its definition")]
impl Level {
    /// Allocate the two sentinels of an empty level, linked to each other.
    #[must_use]
    pub fn new<V>(arena: &mut NodeArena<V>) -> Self {
        let head = arena.alloc(Node::sentinel(f64::NEG_INFINITY));
        let tail = arena.alloc(Node::sentinel(f64::INFINITY));
        arena.link_horizontal(head, tail);

        Self { head, tail, len: 0 }
    }

    #[inline]
    #[must_use]
    pub const fn head(&self) -> NodeId {
        self.head
    }

    #[inline]
    #[must_use]
    pub const fn tail(&self) -> NodeId {
        self.tail
    }

    /// The number of non-sentinel nodes on the level.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Put `node`, which must not be linked horizontally, directly after `prev` on this level.
    ///
    /// The caller is responsible for `node`'s key sorting strictly between `prev` and the node
    /// after it.
    pub fn splice_after<V>(&mut self, arena: &mut NodeArena<V>, prev: NodeId, node: NodeId) {
        #[expect(clippy::expect_used, reason = "only the tail sentinel lacks a `next` node")]
        let next = arena[prev].next().expect("cannot splice after the tail sentinel");

        debug_assert!(
            arena.key(prev) < arena.key(node) && arena.key(node) < arena.key(next),
            "spliced node must sort between its neighbours",
        );

        arena.link_horizontal(prev, node);
        arena.link_horizontal(node, next);
        self.len += 1;
    }

    /// Unlink `node`, which must be a non-sentinel node on this level, from all of its neighbours.
    /// The node is not freed.
    pub fn unlink<V>(&mut self, arena: &mut NodeArena<V>, node: NodeId) {
        debug_assert!(!arena[node].is_sentinel(), "sentinels are never unlinked from a level");

        arena.unlink(node);
        self.len -= 1;
    }

    /// Insert `key` in sorted order, scanning from the head, or replace the value of the node
    /// which already holds `key`. Returns the node now holding `key`.
    ///
    /// # Errors
    /// Returns [`QueueError::KeyNotANumber`] if `key` is `NaN`, and
    /// [`QueueError::KeyNotFinite`] if `key` is infinite. Only sentinels hold infinite keys.
    #[cfg_attr(not(test), allow(dead_code, reason = "scanning ops for standalone levels"))]
    pub fn add<V>(
        &mut self,
        arena: &mut NodeArena<V>,
        key:   f64,
        value: V,
    ) -> Result<NodeId, QueueError> {
        if key.is_infinite() {
            return Err(QueueError::KeyNotFinite(key));
        }
        let node = Node::entry(key, value)?;

        let mut current = self.head;
        loop {
            let Some(next) = arena[current].next() else {
                break;
            };

            let next_key = arena.key(next);
            if next_key < key {
                current = next;
            } else {
                #[expect(clippy::float_cmp, reason = "keys are compared exactly")]
                let occupied = next_key == key;

                if occupied {
                    if let Some(value) = node.into_value() {
                        arena.update_value(next, value);
                    }
                    return Ok(next);
                }
                break;
            }
        }

        let node = arena.alloc(node);
        self.splice_after(arena, current, node);
        Ok(node)
    }

    /// Find the node holding `key` by scanning from the head.
    #[must_use]
    #[cfg_attr(not(test), allow(dead_code, reason = "scanning ops for standalone levels"))]
    pub fn get<V>(&self, arena: &NodeArena<V>, key: f64) -> Link {
        self.node_ids(arena)
            .take_while(|&id| arena.key(id) <= key)
            .find(|&id| {
                #[expect(clippy::float_cmp, reason = "keys are compared exactly")]
                let found = arena.key(id) == key;
                found
            })
    }

    /// Unlink and free the node holding `key`, returning the value it owned.
    ///
    /// Returns `None` if `key` is not on this level, or if the node held no value of its own
    /// (as is the case for nodes promoted from a lower level).
    #[cfg_attr(not(test), allow(dead_code, reason = "scanning ops for standalone levels"))]
    pub fn remove<V>(&mut self, arena: &mut NodeArena<V>, key: f64) -> Option<V> {
        let node = self.get(arena, key)?;
        self.unlink(arena, node);
        arena.free(node)
    }

    /// Visit the non-sentinel nodes of the level in ascending key order, along with the value
    /// of the entry each belongs to.
    pub fn for_each<'a, V: 'a, F>(&self, arena: &'a NodeArena<V>, mut callback: F)
    where
        F: FnMut(f64, &'a V),
    {
        for id in self.node_ids(arena) {
            if let Some(value) = arena.value(id) {
                callback(arena.key(id), value);
            }
        }
    }

    /// Iterate over the handles of the non-sentinel nodes of the level, in ascending key order.
    pub fn node_ids<'a, V>(&self, arena: &'a NodeArena<V>) -> NodeIds<'a, V> {
        NodeIds {
            arena,
            current: arena[self.head].next(),
        }
    }

    /// Free the sentinels of an empty level, detaching them from any sentinels above or below.
    pub fn release<V>(self, arena: &mut NodeArena<V>) {
        debug_assert!(self.is_empty(), "only empty levels are released");

        arena.unlink(self.head);
        arena.unlink(self.tail);
        arena.free(self.head);
        arena.free(self.tail);
    }
}

#[derive(Debug)]
pub(crate) struct NodeIds<'a, V> {
    arena:   &'a NodeArena<V>,
    current: Link,
}

impl<V> Iterator for NodeIds<'_, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        let node = &self.arena[current];

        if node.next().is_none() {
            // Reached the tail sentinel.
            self.current = None;
            return None;
        }

        self.current = node.next();
        Some(current)
    }
}

/// An ordered copy of the keys and values on one level of a [`SkipQueue`], as produced by
/// [`SkipQueue::for_each_list`].
///
/// The `Display` output lists the keys of the level between its sentinels, e.g.
/// `-inf <-> -1 <-> 0.5 <-> +inf`.
///
/// [`SkipQueue`]: crate::SkipQueue
/// [`SkipQueue::for_each_list`]: crate::SkipQueue::for_each_list
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot<'a, V> {
    level:   usize,
    entries: Vec<(f64, &'a V)>,
}

impl<'a, V> LevelSnapshot<'a, V> {
    pub(crate) fn capture(depth: usize, level: &Level, arena: &'a NodeArena<V>) -> Self {
        let mut entries = Vec::with_capacity(level.len());
        level.for_each(arena, |key, value| entries.push((key, value)));

        Self {
            level: depth,
            entries,
        }
    }

    /// Which level this is a snapshot of; `0` is the bottom level, which holds every entry.
    #[inline]
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// The entries of the level, in ascending key order.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[(f64, &'a V)] {
        &self.entries
    }

    #[must_use]
    pub fn keys(&self) -> Vec<f64> {
        self.entries.iter().map(|&(key, _)| key).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Display for LevelSnapshot<'_, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("-inf")?;
        for (key, _) in &self.entries {
            write!(f, " <-> {key}")?;
        }
        f.write_str(" <-> +inf")
    }
}


#[cfg(test)]
mod tests {
    use super::*;


    fn keys_of<V>(level: &Level, arena: &NodeArena<V>) -> Vec<f64> {
        level.node_ids(arena).map(|id| arena.key(id)).collect()
    }

    #[test]
    fn empty_level() {
        let mut arena: NodeArena<()> = NodeArena::new();
        let level = Level::new(&mut arena);

        assert!(level.is_empty());
        assert_eq!(arena[level.head()].next(), Some(level.tail()));
        assert_eq!(arena[level.tail()].prev(), Some(level.head()));
        assert!(keys_of(&level, &arena).is_empty());
        assert!(level.get(&arena, 0.).is_none());
    }

    #[test]
    fn add_keeps_keys_sorted() {
        let mut arena = NodeArena::new();
        let mut level = Level::new(&mut arena);

        for key in [3., -1., 2.5, 0., 10.] {
            level.add(&mut arena, key, key * 2.).unwrap();
        }

        assert_eq!(level.len(), 5);
        assert_eq!(keys_of(&level, &arena), [-1., 0., 2.5, 3., 10.]);

        let mut seen = Vec::new();
        level.for_each(&arena, |key, &value| seen.push((key, value)));
        assert_eq!(seen, [(-1., -2.), (0., 0.), (2.5, 5.), (3., 6.), (10., 20.)]);
    }

    #[test]
    fn add_existing_key_updates_value() {
        let mut arena = NodeArena::new();
        let mut level = Level::new(&mut arena);

        let first = level.add(&mut arena, 1., "old").unwrap();
        let second = level.add(&mut arena, 1., "new").unwrap();

        assert_eq!(first, second);
        assert_eq!(level.len(), 1);
        assert_eq!(arena.value(first), Some(&"new"));
    }

    #[test]
    fn add_rejects_non_finite_keys() {
        let mut arena = NodeArena::new();
        let mut level = Level::new(&mut arena);

        assert_eq!(
            level.add(&mut arena, f64::INFINITY, ()),
            Err(QueueError::KeyNotFinite(f64::INFINITY)),
        );
        assert_eq!(
            level.add(&mut arena, f64::NEG_INFINITY, ()),
            Err(QueueError::KeyNotFinite(f64::NEG_INFINITY)),
        );
        assert_eq!(level.add(&mut arena, f64::NAN, ()), Err(QueueError::KeyNotANumber));
        assert!(level.is_empty());
    }

    #[test]
    fn get_and_remove() {
        let mut arena = NodeArena::new();
        let mut level = Level::new(&mut arena);
        for key in [1., 2., 3.] {
            level.add(&mut arena, key, key as u8).unwrap();
        }

        let two = level.get(&arena, 2.).unwrap();
        assert_eq!(arena.value(two), Some(&2));
        assert!(level.get(&arena, 2.5).is_none());

        assert_eq!(level.remove(&mut arena, 2.), Some(2));
        assert_eq!(level.remove(&mut arena, 2.), None);
        assert_eq!(level.len(), 2);
        assert_eq!(keys_of(&level, &arena), [1., 3.]);
    }

    #[test]
    fn release_frees_sentinels() {
        let mut arena: NodeArena<()> = NodeArena::new();
        let lower = Level::new(&mut arena);
        let upper = Level::new(&mut arena);
        arena.link_vertical(lower.head(), upper.head());
        arena.link_vertical(lower.tail(), upper.tail());
        assert_eq!(arena.live_nodes(), 4);

        upper.release(&mut arena);

        assert_eq!(arena.live_nodes(), 2);
        assert!(arena[lower.head()].above().is_none());
        assert!(arena[lower.tail()].above().is_none());
    }

    #[test]
    fn snapshot_display() {
        let mut arena = NodeArena::new();
        let mut level = Level::new(&mut arena);
        for key in [0.5, -1.] {
            level.add(&mut arena, key, ()).unwrap();
        }

        let snapshot = LevelSnapshot::capture(0, &level, &arena);
        assert_eq!(snapshot.level(), 0);
        assert_eq!(snapshot.keys(), [-1., 0.5]);
        assert_eq!(snapshot.to_string(), "-inf <-> -1 <-> 0.5 <-> +inf");

        let empty = LevelSnapshot::capture(0, &Level::new(&mut arena), &arena);
        assert!(empty.is_empty());
        assert_eq!(empty.to_string(), "-inf <-> +inf");
    }
}
