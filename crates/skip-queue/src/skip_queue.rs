use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::iter::FusedIterator;

use oorandom::Rand32;
use tracing::Level as LogLevel;

use crate::{
    coin::{CoinFlip, default_coin},
    error::{QueueError, validate_key},
    fractional::key_between,
    level::{Level, LevelSnapshot},
    node::{Link, Node, NodeArena, NodeId},
};


/// An ordered queue of values, each identified by an `f64` key, which supports inserting a value
/// directly after any existing entry without renumbering any other entry.
///
/// The caller never picks keys or positions. [`add_after`] takes the key of the entry the new
/// value should follow (or `None` to put it first), assigns a fresh key strictly between that
/// entry and the next one, and returns it. Keys of existing entries never change.
///
/// Internally, this is a [skiplist] of doubly-linked levels: level 0 holds every entry, and each
/// entry is promoted to each successive level with probability 1/2, so searches and insertions
/// take expected `O(log n)` time.
///
/// # Errors
/// Keys are bounded-precision `f64`s, so the room between two neighbours eventually runs out.
/// When it does, `add_after` returns an error instead of degrading; see [`QueueError`].
///
/// [`add_after`]: SkipQueue::add_after
/// [skiplist]: https://en.wikipedia.org/wiki/Skip_list
pub struct SkipQueue<V, C = Rand32> {
    arena:  NodeArena<V>,
    /// Level 0, which holds every entry. It always exists, even when empty.
    bottom: Level,
    /// Levels 1 and up. The topmost level is never empty.
    upper:  Vec<Level>,
    coin:   C,
}

impl<V> SkipQueue<V> {
    /// Create an empty queue whose promotion coin is seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_coin(default_coin())
    }

    /// Create an empty queue whose promotion coin produces a reproducible sequence of flips.
    #[must_use]
    pub fn new_seeded(seed: u64) -> Self {
        Self::with_coin(Rand32::new(seed))
    }
}

impl<V> Default for SkipQueue<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// Short utility functions
impl<V, C> SkipQueue<V, C> {
    /// The level at index `depth`, where `0` is the bottom level.
    fn level(&self, depth: usize) -> Option<&Level> {
        match depth.checked_sub(1) {
            None        => Some(&self.bottom),
            Some(upper) => self.upper.get(upper),
        }
    }

    /// The level at index `depth` along with the arena, which every mutation of a level needs.
    fn level_mut(&mut self, depth: usize) -> Option<(&mut Level, &mut NodeArena<V>)> {
        let level = match depth.checked_sub(1) {
            None        => &mut self.bottom,
            Some(upper) => self.upper.get_mut(upper)?,
        };
        Some((level, &mut self.arena))
    }

    #[inline]
    fn top(&self) -> &Level {
        self.upper.last().unwrap_or(&self.bottom)
    }

    /// Allocate a new topmost level, with its sentinels linked to those of the previous top.
    fn push_level(&mut self) {
        let below = *self.top();
        let level = Level::new(&mut self.arena);

        self.arena.link_vertical(below.head(), level.head());
        self.arena.link_vertical(below.tail(), level.tail());
        self.upper.push(level);

        tracing::event!(LogLevel::TRACE, height = self.height(), "skip queue grew a level");
    }

    /// Discard empty levels from the top down. Level 0 is never discarded.
    fn prune_empty_levels(&mut self) {
        let height = self.height();

        while self.upper.last().is_some_and(Level::is_empty) {
            if let Some(level) = self.upper.pop() {
                level.release(&mut self.arena);
            }
        }

        if self.height() < height {
            tracing::event!(
                LogLevel::TRACE,
                from = height,
                to = self.height(),
                "skip queue discarded empty levels",
            );
        }
    }
}

// Search
impl<V, C> SkipQueue<V, C> {
    /// Find the highest node holding `key`, scanning each level from the top down.
    ///
    /// On each level, move forward while the next node's key is at most `key`; if the node
    /// reached holds `key`, it is returned immediately. Otherwise, descend one level.
    ///
    /// `key` may be `-inf`, in which case the head sentinel of the top level is returned.
    fn find(&self, key: f64) -> Link {
        let mut current = self.top().head();

        loop {
            while let Some(next) = self.arena[current].next() {
                if self.arena.key(next) <= key {
                    current = next;
                } else {
                    break;
                }
            }

            #[expect(clippy::float_cmp, reason = "keys are compared exactly")]
            let found = self.arena.key(current) == key;

            if found {
                return Some(current);
            }
            current = self.arena[current].below()?;
        }
    }

    /// Find the level-0 node holding `key`, which is the node whose links are spliced around when
    /// inserting or removing.
    fn find_bottom(&self, key: f64) -> Link {
        self.find(key).map(|found| self.arena.bottom_of(found))
    }
}

impl<V, C> SkipQueue<V, C> {
    /// Create an empty queue which uses the provided coin to decide promotions.
    ///
    /// A [`ScriptedCoin`] makes the shape of the queue fully deterministic.
    ///
    /// [`ScriptedCoin`]: crate::ScriptedCoin
    #[must_use]
    pub fn with_coin(coin: C) -> Self {
        let mut arena = NodeArena::new();
        let bottom = Level::new(&mut arena);

        Self {
            arena,
            bottom,
            upper: Vec::new(),
            coin,
        }
    }

    /// The number of entries in the queue.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bottom.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bottom.is_empty()
    }

    /// The number of levels currently allocated, which is at least `1`.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.upper.len() + 1
    }

    #[inline]
    #[must_use]
    pub const fn coin(&self) -> &C {
        &self.coin
    }

    /// Mutable access to the promotion coin, for instance to extend a [`ScriptedCoin`].
    ///
    /// [`ScriptedCoin`]: crate::ScriptedCoin
    #[inline]
    #[must_use]
    pub const fn coin_mut(&mut self) -> &mut C {
        &mut self.coin
    }

    /// Get the value of the entry with the given key.
    ///
    /// # Errors
    /// [`QueueError::KeyNotANumber`] if `key` is `NaN`, and [`QueueError::KeyNotFinite`] if it
    /// is infinite.
    pub fn get(&self, key: f64) -> Result<Option<&V>, QueueError> {
        let key = validate_key(key)?;
        Ok(self.find(key).and_then(|node| self.arena.value(node)))
    }

    /// Get mutable access to the value of the entry with the given key.
    ///
    /// # Errors
    /// Same as [`get`](SkipQueue::get).
    pub fn get_mut(&mut self, key: f64) -> Result<Option<&mut V>, QueueError> {
        let key = validate_key(key)?;
        Ok(self.find(key).and_then(|node| self.arena.value_mut(node)))
    }

    /// # Errors
    /// Same as [`get`](SkipQueue::get).
    pub fn contains_key(&self, key: f64) -> Result<bool, QueueError> {
        let key = validate_key(key)?;
        Ok(self.find(key).is_some())
    }

    /// Replace the value of the entry with the given key. Returns `Ok(false)`, dropping `value`,
    /// if there is no such entry.
    ///
    /// # Errors
    /// Same as [`get`](SkipQueue::get).
    pub fn set(&mut self, key: f64, value: V) -> Result<bool, QueueError> {
        let key = validate_key(key)?;

        if let Some(node) = self.find(key) {
            self.arena.update_value(node, value);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove the entry with the given key, returning whether it was present.
    ///
    /// # Errors
    /// Same as [`get`](SkipQueue::get).
    pub fn remove(&mut self, key: f64) -> Result<bool, QueueError> {
        self.take(key).map(|value| value.is_some())
    }

    /// Remove the entry with the given key, returning its value if it was present.
    ///
    /// The entry's node is unlinked from every level it occupies, from the top down; afterwards,
    /// any level above level 0 which became empty is discarded along with all levels above it.
    ///
    /// # Errors
    /// Same as [`get`](SkipQueue::get).
    pub fn take(&mut self, key: f64) -> Result<Option<V>, QueueError> {
        let key = validate_key(key)?;

        let Some(bottom) = self.find_bottom(key) else {
            return Ok(None);
        };
        let (top, top_depth) = self.arena.top_of(bottom);

        let mut node = top;
        for depth in (0..=top_depth).rev() {
            let below = self.arena[node].below();

            #[expect(clippy::expect_used, reason = "a node's stack never exceeds the height")]
            let (level, arena) = self.level_mut(depth).expect("node stack is taller than the queue");
            level.unlink(arena, node);

            let value = arena.free(node);
            match below {
                Some(below) => node = below,
                None => {
                    self.prune_empty_levels();
                    return Ok(value);
                }
            }
        }

        // The loop always ends at level 0, where `below` is `None`.
        Ok(None)
    }

    /// Insert `value` directly after the entry keyed by `relative_key`, and return the key
    /// assigned to the new entry.
    ///
    /// If `relative_key` is `None` (or `-inf`), the value is inserted before every other entry.
    ///
    /// The new key is the mean of the keys of the two entries it is placed between; at either end
    /// of the queue, it is the next integer outward (or `0` in an empty queue). See
    /// [`key_between`] for the exact rule.
    ///
    /// # Errors
    /// On error, the queue is left exactly as it was.
    /// - [`QueueError::RelativeKeyNotANumber`] if `relative_key` is `NaN`.
    /// - [`QueueError::RelativeKeyInfinite`] if `relative_key` is `+inf`.
    /// - [`QueueError::RelativeKeyNotFound`] if no entry has key `relative_key`.
    /// - [`QueueError::TooMuchAveraging`] if no `f64` lies strictly between the two neighbours.
    /// - [`QueueError::UnsafeInteger`] if appending or prepending would leave the range of
    ///   exactly-representable integers.
    ///
    /// [`key_between`]: crate::fractional::key_between
    pub fn add_after(&mut self, relative_key: Option<f64>, value: V) -> Result<f64, QueueError>
    where
        C: CoinFlip,
    {
        let prev = match relative_key {
            None => self.bottom.head(),
            Some(key) if key.is_nan() => return Err(QueueError::RelativeKeyNotANumber),
            Some(key) if key.is_infinite() && key.is_sign_positive() => {
                return Err(QueueError::RelativeKeyInfinite);
            }
            Some(key) => self.find_bottom(key).ok_or(QueueError::RelativeKeyNotFound(key))?,
        };

        #[expect(clippy::expect_used, reason = "`prev` is never the tail sentinel")]
        let next = self.arena[prev].next().expect("only the tail sentinel lacks a next node");

        let key = key_between(self.arena.key(prev), self.arena.key(next))?;

        // Nothing has been mutated up to this point.
        let node = self.arena.alloc(Node::entry(key, value)?);
        self.bottom.splice_after(&mut self.arena, prev, node);
        self.promote(node);

        Ok(key)
    }

    /// Promote a freshly inserted level-0 node up through the levels, one level per successful
    /// coin flip, creating levels as needed.
    fn promote(&mut self, bottom: NodeId)
    where
        C: CoinFlip,
    {
        let mut lower = bottom;
        let mut depth = 0;

        while self.coin.flip() {
            depth += 1;
            if depth == self.height() {
                self.push_level();
            }

            // Walk back along the lower level until reaching a node which continues upwards.
            // Head sentinels always do, so this terminates.
            let mut pred = lower;
            let upper_pred = loop {
                #[expect(clippy::expect_used, reason = "the head sentinel is linked upwards")]
                let prev = self.arena[pred].prev().expect("walked past the head sentinel");
                pred = prev;

                if let Some(above) = self.arena[pred].above() {
                    break above;
                }
            };

            let upper = self.arena.alloc(self.arena[lower].index_copy(bottom));

            #[expect(clippy::expect_used, reason = "the level was pushed above if needed")]
            let (level, arena) = self.level_mut(depth).expect("promotion target level exists");
            level.splice_after(arena, upper_pred, upper);
            arena.link_vertical(lower, upper);

            lower = upper;
        }
    }

    /// Visit every entry in ascending key order.
    pub fn for_each<F: FnMut(f64, &V)>(&self, mut callback: F) {
        for (key, value) in self.iter() {
            callback(key, value);
        }
    }

    /// Visit a snapshot of every level, from the topmost level down to level 0.
    ///
    /// This exposes the internal structure of the queue, and is meant for introspection and tests
    /// rather than for traversing entries (use [`iter`] or [`for_each`] for that).
    ///
    /// [`iter`]: SkipQueue::iter
    /// [`for_each`]: SkipQueue::for_each
    pub fn for_each_list<'a, F: FnMut(LevelSnapshot<'a, V>)>(&'a self, mut callback: F) {
        for depth in (0..self.height()).rev() {
            if let Some(level) = self.level(depth) {
                callback(LevelSnapshot::capture(depth, level, &self.arena));
            }
        }
    }

    /// Iterate over `(key, &value)` pairs in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            arena:     &self.arena,
            front:     self.arena[self.bottom.head()].next(),
            back:      self.arena[self.bottom.tail()].prev(),
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// The entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<(f64, &V)> {
        self.iter().next()
    }

    /// The entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &V)> {
        self.iter().next_back()
    }
}

impl<V: Debug, C> Debug for SkipQueue<V, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V, C> IntoIterator for &'a SkipQueue<V, C> {
    type Item     = (f64, &'a V);
    type IntoIter = Iter<'a, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of a [`SkipQueue`] in ascending key order.
#[derive(Debug)]
pub struct Iter<'a, V> {
    arena:     &'a NodeArena<V>,
    front:     Link,
    back:      Link,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, V> Iter<'a, V> {
    fn entry(&self, node: NodeId) -> (f64, &'a V) {
        #[expect(clippy::expect_used, reason = "every non-sentinel level-0 node owns a value")]
        let value = self.arena.value(node).expect("level-0 entry without a value");
        (self.arena.key(node), value)
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (f64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front?;

        self.front = self.arena[node].next();
        self.remaining -= 1;
        Some(self.entry(node))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back?;

        self.back = self.arena[node].prev();
        self.remaining -= 1;
        Some(self.entry(node))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}
