use std::sync::Arc;

use oorandom::Rand32;
use parking_lot::{Mutex, MutexGuard};

use crate::{coin::CoinFlip, error::QueueError, skip_queue::SkipQueue};


/// A cloneable, threadsafe handle to a single [`SkipQueue`].
///
/// `SkipQueue` has no internal synchronization. A host which exposes one queue to several threads
/// (for instance, a request-handling server exposing one playback queue per user) shares it
/// through this handle: every clone refers to the same queue behind the same lock, and each
/// operation holds the lock for its whole duration. Independent queues should each have their
/// own `SharedSkipQueue`, so that they never contend on a lock.
///
/// For several operations that must observe a consistent queue, hold the guard returned by
/// [`lock`](SharedSkipQueue::lock) across them.
#[derive(Debug)]
pub struct SharedSkipQueue<V, C = Rand32> {
    inner: Arc<Mutex<SkipQueue<V, C>>>,
}

impl<V, C> Clone for SharedSkipQueue<V, C> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SharedSkipQueue<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::from(SkipQueue::new())
    }

    #[must_use]
    pub fn new_seeded(seed: u64) -> Self {
        Self::from(SkipQueue::new_seeded(seed))
    }
}

impl<V> Default for SharedSkipQueue<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C> From<SkipQueue<V, C>> for SharedSkipQueue<V, C> {
    #[inline]
    fn from(queue: SkipQueue<V, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }
}

impl<V, C> SharedSkipQueue<V, C> {
    /// Lock the queue, blocking until no other handle holds the lock.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, SkipQueue<V, C>> {
        self.inner.lock()
    }

    /// Whether `self` and `other` are handles to the same queue.
    #[inline]
    #[must_use]
    pub fn same_queue(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reclaim the queue, if this is the last handle to it. Otherwise, `self` is returned.
    pub fn try_into_inner(self) -> Result<SkipQueue<V, C>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`SkipQueue::add_after`].
    ///
    /// # Errors
    /// Same as [`SkipQueue::add_after`].
    pub fn add_after(&self, relative_key: Option<f64>, value: V) -> Result<f64, QueueError>
    where
        C: CoinFlip,
    {
        self.lock().add_after(relative_key, value)
    }

    /// Clone the value of the entry with the given key. See [`SkipQueue::get`].
    ///
    /// # Errors
    /// Same as [`SkipQueue::get`].
    pub fn get_cloned(&self, key: f64) -> Result<Option<V>, QueueError>
    where
        V: Clone,
    {
        self.lock().get(key).map(|value| value.cloned())
    }

    /// See [`SkipQueue::set`].
    ///
    /// # Errors
    /// Same as [`SkipQueue::set`].
    pub fn set(&self, key: f64, value: V) -> Result<bool, QueueError> {
        self.lock().set(key, value)
    }

    /// See [`SkipQueue::remove`].
    ///
    /// # Errors
    /// Same as [`SkipQueue::remove`].
    pub fn remove(&self, key: f64) -> Result<bool, QueueError> {
        self.lock().remove(key)
    }

    /// See [`SkipQueue::take`].
    ///
    /// # Errors
    /// Same as [`SkipQueue::take`].
    pub fn take(&self, key: f64) -> Result<Option<V>, QueueError> {
        self.lock().take(key)
    }

    /// Clone every entry, in ascending key order, under a single acquisition of the lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(f64, V)>
    where
        V: Clone,
    {
        self.lock()
            .iter()
            .map(|(key, value)| (key, value.clone()))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use crate::coin::ScriptedCoin;
    use super::*;


    #[test]
    fn clones_share_one_queue() {
        let queue: SharedSkipQueue<&str> = SharedSkipQueue::new_seeded(5);
        let other = queue.clone();
        assert!(queue.same_queue(&other));
        assert!(!queue.same_queue(&SharedSkipQueue::new_seeded(5)));

        let first = queue.add_after(None, "first").unwrap();
        other.add_after(Some(first), "second").unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(other.snapshot(), [(0., "first"), (1., "second")]);

        assert_eq!(other.take(0.), Ok(Some("first")));
        assert_eq!(queue.get_cloned(0.), Ok(None));
    }

    #[test]
    fn guard_spans_several_operations() {
        let queue = SharedSkipQueue::from(SkipQueue::with_coin(ScriptedCoin::default()));

        {
            let mut guard = queue.lock();
            let a = guard.add_after(None, 'a').unwrap();
            guard.add_after(Some(a), 'b').unwrap();
            assert_eq!(guard.set(a, 'z'), Ok(true));
        }

        assert_eq!(queue.snapshot(), [(0., 'z'), (1., 'b')]);
    }

    #[test]
    fn reclaiming_the_queue() {
        let queue: SharedSkipQueue<u8> = SharedSkipQueue::new_seeded(9);
        let other = queue.clone();

        let queue = queue.try_into_inner().unwrap_err();
        drop(other);

        let inner = queue.try_into_inner().unwrap();
        assert!(inner.is_empty());
    }
}
