//! Token-bucket rate limiter shared by map-phase workers
//!
//! Each `acquire` reserves the next free slot under a mutex, then sleeps
//! until that slot outside the lock. Reservations are handed out in the
//! order callers reach the mutex, so concurrent workers line up at a
//! steady rate no matter how many run at once.

use super::cancel::CancellationToken;
use super::types::AnalysisError;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub struct RateLimiter {
    interval: Duration,
    /// How far ahead of schedule a caller may run (`(burst - 1) * interval`)
    tolerance: Duration,
    /// Theoretical arrival time of the next request
    next: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// A limiter granting one slot per `interval`, allowing `burst`
    /// slots back to back when idle. A burst of 0 is treated as 1.
    pub fn new(interval: Duration, burst: u32) -> Self {
        Self {
            interval,
            tolerance: interval * burst.saturating_sub(1),
            next: Mutex::new(None),
        }
    }

    fn reserve(&self) -> Instant {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let due = next.map_or(now, |t| t.max(now));
        *next = Some(due + self.interval);
        due.checked_sub(self.tolerance)
            .map_or(now, |slot| slot.max(now))
    }

    /// Wait for a slot.
    ///
    /// Fails with `AnalysisError::Cancelled` if `cancel` fires first. The
    /// reserved slot is not returned to the bucket in that case.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AnalysisError> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        let slot = self.reserve();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnalysisError::Cancelled),
            _ = tokio::time::sleep_until(slot) => Ok(()),
        }
    }
}
