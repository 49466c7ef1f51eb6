//! # Jitter for polling intervals.
//!
//! When many services poll the registry on the same interval their checks line
//! up. [`JitterPolicy`] spreads them out.
//!
//! - [`JitterPolicy::None`]: exact interval
//! - [`JitterPolicy::Full`]: random in `[0, interval]`
//! - [`JitterPolicy::Equal`]: `interval/2 + random[0, interval/2]`

use rand::Rng;
use std::time::Duration;

/// Randomization applied to each polling interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the interval as computed.
    #[default]
    None,
    /// Random delay in `[0, interval]`; can shorten waits a lot.
    Full,
    /// Keeps at least half of the interval.
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return delay;
        }
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + extra)
            }
        }
    }
}
