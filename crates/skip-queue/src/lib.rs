//! An ordered queue which inserts entries between existing neighbours without ever renumbering
//! them, backed by a doubly-linked [skiplist].
//!
//! Every entry of a [`SkipQueue`] has an `f64` key, assigned by the queue. To insert a value, the
//! caller names the entry it should follow (or none, to put it first), and the queue picks a key
//! strictly between that entry and the next one: their mean, or the next integer outward at either
//! end of the queue. No other key is touched, so keys handed out earlier stay valid for as long as
//! their entries exist.
//!
//! ```
//! use skip_queue::SkipQueue;
//!
//! let mut queue = SkipQueue::new();
//!
//! let a = queue.add_after(None, "a").unwrap();
//! let b = queue.add_after(Some(a), "b").unwrap();
//! let c = queue.add_after(Some(a), "c").unwrap();
//!
//! assert_eq!((a, b, c), (0., 1., 0.5));
//! assert_eq!(queue.values().copied().collect::<Vec<_>>(), ["a", "c", "b"]);
//!
//! assert_eq!(queue.remove(c), Ok(true));
//! assert_eq!(queue.get(b), Ok(Some(&"b")));
//! ```
//!
//! Since keys are `f64`s, the room between two neighbours is finite. Once a gap can no longer be
//! split, or the keys at either end of the queue leave the range of exactly-representable
//! integers, [`SkipQueue::add_after`] returns a [`QueueError`] and leaves the queue untouched.
//!
//! A `SkipQueue` is not synchronized; [`SharedSkipQueue`] wraps one behind a lock for hosts
//! which serve it to several threads.
//!
//! [skiplist]: https://en.wikipedia.org/wiki/Skip_list

mod coin;
mod error;
mod level;
mod node;
mod shared;
mod skip_queue;

pub mod fractional;


pub use self::{
    coin::{CoinFlip, ScriptedCoin},
    error::{ErrorKind, QueueError},
    level::LevelSnapshot,
    shared::SharedSkipQueue,
    skip_queue::{Iter, SkipQueue},
};
