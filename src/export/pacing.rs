//! Jittered delay between messages.
//!
//! Keeps request cadence uniform regardless of what a message contained.

use std::time::Duration;

use rand::Rng;

/// Uniform delay interval. The pause happens after every processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    /// Build an interval; bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Zero-length interval. The pause point is still visited.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay uniformly from `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleep for a sampled delay and return it.
    pub async fn pause(&self) -> Duration {
        let delay = self.sample();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Pausing before next message");
        tokio::time::sleep(delay).await;
        delay
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(3))
    }
}
