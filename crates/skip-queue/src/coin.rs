use std::collections::VecDeque;

use oorandom::Rand32;


/// Seed used for the default coin when the operating system's randomness source is unavailable.
const FALLBACK_SEED: u64 = 0x5EED_C01D;


/// A source of coin flips, used to decide how far a newly inserted entry is promoted up the
/// levels of a [`SkipQueue`].
///
/// Each `true` promotes the entry one more level; the first `false` stops promotion.
///
/// [`SkipQueue`]: crate::SkipQueue
pub trait CoinFlip {
    /// Flip the coin. The production source returns `true` with probability 1/2.
    #[must_use]
    fn flip(&mut self) -> bool;
}

impl CoinFlip for Rand32 {
    #[inline]
    fn flip(&mut self) -> bool {
        self.rand_u32() % 2 == 0
    }
}

impl<C: CoinFlip + ?Sized> CoinFlip for Box<C> {
    #[inline]
    fn flip(&mut self) -> bool {
        (**self).flip()
    }
}

/// Create the coin used by [`SkipQueue::new`].
///
/// [`SkipQueue::new`]: crate::SkipQueue::new
pub(crate) fn default_coin() -> Rand32 {
    let seed = getrandom::u64().unwrap_or(FALLBACK_SEED);
    Rand32::new(seed)
}

/// A [`CoinFlip`] which replays a fixed sequence of outcomes, for deterministic tests.
///
/// Once the script runs out, every flip returns `false`, so no further promotion happens.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCoin {
    outcomes: VecDeque<bool>,
}

impl ScriptedCoin {
    #[inline]
    #[must_use]
    pub fn new<I: IntoIterator<Item = bool>>(outcomes: I) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
        }
    }

    /// Append more outcomes to the end of the script.
    pub fn extend<I: IntoIterator<Item = bool>>(&mut self, outcomes: I) {
        self.outcomes.extend(outcomes);
    }

    /// The number of scripted outcomes that have not yet been flipped.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }
}

impl CoinFlip for ScriptedCoin {
    #[inline]
    fn flip(&mut self) -> bool {
        self.outcomes.pop_front().unwrap_or(false)
    }
}
