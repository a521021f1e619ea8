//! Randomized pacing: seeded jitter and cancellable sleeps.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

/// The wait was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Shared randomness source for delays, identities and site order.
///
/// Clones share one generator, so a fixed seed makes a whole run reproducible.
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: Arc<Mutex<StdRng>>,
}

impl Jitter {
    /// Seeded when `seed` is given, otherwise seeded from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Uniform duration in `[0, max]`, millisecond resolution.
    pub fn up_to(&self, max: Duration) -> Duration {
        self.between(Duration::ZERO, max)
    }

    /// Uniform duration in `[min, max]`, millisecond resolution.
    pub fn between(&self, min: Duration, max: Duration) -> Duration {
        let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
        if hi <= lo {
            return min;
        }
        Duration::from_millis(self.with_rng(|rng| rng.random_range(lo..=hi)))
    }

    /// Uniform integer in `[lo, hi]`.
    pub fn range(&self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        self.with_rng(|rng| rng.random_range(lo..=hi))
    }

    /// Uniform index into a collection of `len` items (`len` > 0).
    pub fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.with_rng(|rng| rng.random_range(0..len))
    }

    /// Random `[A-Za-z0-9]` string.
    pub fn alphanumeric(&self, len: usize) -> String {
        self.with_rng(|rng| {
            rng.sample_iter(Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        })
    }

    pub fn shuffle<T>(&self, items: &mut [T]) {
        self.with_rng(|rng| items.shuffle(rng));
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Sleep for `duration` unless `cancel` fires first.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        return Err(Cancelled);
    }
    if duration.is_zero() {
        return Ok(());
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let a = Jitter::seeded(7);
        let b = Jitter::seeded(7);
        let mut xs: Vec<u32> = (0..10).collect();
        let mut ys = xs.clone();
        a.shuffle(&mut xs);
        b.shuffle(&mut ys);
        assert_eq!(xs, ys);
        assert_eq!(a.alphanumeric(12), b.alphanumeric(12));
    }

    #[test]
    fn test_bounds() {
        let jitter = Jitter::seeded(1);
        for _ in 0..100 {
            let d = jitter.between(Duration::from_millis(500), Duration::from_millis(1500));
            assert!(d >= Duration::from_millis(500) && d <= Duration::from_millis(1500));
            let w = jitter.range(1200, 1599);
            assert!((1200..=1599).contains(&w));
            assert!(jitter.index(3) < 3);
        }
        assert_eq!(jitter.up_to(Duration::ZERO), Duration::ZERO);
        let token = jitter.alphanumeric(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_cancellable() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let handle = tokio::spawn(async move { pause(Duration::from_secs(3600), &child).await });
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), Err(Cancelled));

        let live = CancellationToken::new();
        assert_eq!(pause(Duration::from_secs(5), &live).await, Ok(()));
    }
}
