//! Randomized pacing between page actions and scrape targets.
//!
//! Every sleep in the pipeline goes through one policy object so timing
//! stays auditable and tests can substitute a zero-delay policy.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

/// Pacing policy. `Disabled` turns every pause into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Jittered,
    Disabled,
}

impl Pacing {
    pub fn jittered() -> Self {
        Self::Jittered
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Sample a pause duration from a `(min, max)` range of seconds.
    pub fn sample_secs(&self, range: (f64, f64)) -> Duration {
        match self {
            Self::Disabled => Duration::ZERO,
            Self::Jittered => Duration::from_secs_f64(sample_f64(range)),
        }
    }

    /// Sleep for a jittered duration drawn from the range.
    pub async fn pause_secs(&self, range: (f64, f64)) {
        let pause = self.sample_secs(range);
        if !pause.is_zero() {
            debug!(?pause, "pacing pause");
            sleep(pause).await;
        }
    }

    /// Scale a fixed bound by the policy: zero when disabled.
    pub fn scale(&self, bound: Duration) -> Duration {
        match self {
            Self::Disabled => Duration::ZERO,
            Self::Jittered => bound,
        }
    }
}

/// Sample uniformly from `[min, max]`, clamped to non-negative values.
/// A degenerate range collapses to its lower bound.
pub fn sample_f64((min, max): (f64, f64)) -> f64 {
    let min = min.max(0.0);
    if max <= min {
        return min;
    }
    rand::rng().random_range(min..=max)
}

/// Sample uniformly from `[min, max]` pixels/steps.
pub fn sample_u32((min, max): (u32, u32)) -> u32 {
    if max <= min {
        return min;
    }
    rand::rng().random_range(min..=max)
}
