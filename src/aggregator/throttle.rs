use anyhow::{bail, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Admission limiter bounding fetch initiations per rolling time window.
///
/// Keeps a sliding log of the admission instants inside the current window,
/// so no window of `window` length ever observes more than `limit`
/// admissions, regardless of how the callers align with window edges. The
/// log never holds more than `limit` entries.
#[derive(Debug)]
pub struct Throttle {
    limit: usize,
    window: Duration,
    recent: Mutex<VecDeque<Instant>>,
}

impl Throttle {
    pub fn new(limit: usize, window: Duration) -> Result<Self> {
        if limit == 0 {
            bail!("throttle limit must be greater than zero");
        }
        if window.is_zero() {
            bail!("throttle window must be greater than zero");
        }
        Ok(Self {
            limit,
            window,
            recent: Mutex::new(VecDeque::with_capacity(limit)),
        })
    }

    /// Limiter admitting at most `limit` initiations per rolling second.
    pub fn per_second(limit: usize) -> Result<Self> {
        Self::new(limit, Duration::from_secs(1))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Waits until one more initiation fits inside the rolling window, then
    /// records it. Callers awaiting admission are served in lock-acquisition
    /// order; the aggregator dispatches sequentially, so planner order is
    /// preserved.
    pub async fn admit(&self) {
        loop {
            let now = Instant::now();
            let wake_at = {
                let mut recent = self.recent.lock().await;
                while let Some(front) = recent.front() {
                    if now.duration_since(*front) >= self.window {
                        recent.pop_front();
                    } else {
                        break;
                    }
                }

                if recent.len() < self.limit {
                    recent.push_back(now);
                    return;
                }

                *recent.front().expect("full log has a front entry") + self.window
            };

            sleep_until(wake_at).await;
        }
    }
}
