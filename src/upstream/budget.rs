//! Shared request-weight budget for the upstream APIs.
//!
//! One counter per fixed window. A background tick zeroes it at every window
//! boundary; callers that would overflow the window sleep until the next
//! boundary. Weight is charged when granted and never refunded.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, interval_at, sleep};
use tracing::debug;

pub struct RateBudget {
    limit: u32,
    interval: Duration,
    epoch: Instant,
    state: Mutex<BudgetState>,
}

struct BudgetState {
    used: u32,
    window: u64,
}

impl RateBudget {
    /// Create the budget and spawn its reset tick. Must be called inside a
    /// Tokio runtime. The tick stops once the last handle is dropped.
    pub fn new(limit: u32, interval: Duration) -> Arc<Self> {
        let interval = interval.max(Duration::from_millis(1));
        let budget = Arc::new(Self {
            limit,
            interval,
            epoch: Instant::now(),
            state: Mutex::new(BudgetState { used: 0, window: 0 }),
        });

        spawn_reset_tick(Arc::downgrade(&budget), budget.epoch, interval);
        budget
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Weight spent in the current window.
    pub async fn used(&self) -> u32 {
        let mut state = self.state.lock().await;
        self.roll_window(&mut state);
        state.used
    }

    /// Wait until `weight` units fit in the current window, then spend them.
    ///
    /// A single request heavier than the whole limit is granted alone in an
    /// otherwise empty window.
    pub async fn reserve(&self, weight: u32) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.roll_window(&mut state);

                if state.used == 0 || state.used.saturating_add(weight) <= self.limit {
                    state.used = state.used.saturating_add(weight);
                    return;
                }
                self.until_next_window()
            };

            debug!(
                weight,
                limit = self.limit,
                wait_ms = wait.as_millis() as u64,
                "Request budget exhausted, waiting for next window"
            );
            sleep(wait).await;
        }
    }

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        self.roll_window(&mut state);
    }

    // The tick and a waiter woken at the same boundary race; whichever runs
    // first starts the new window, the other is a no-op.
    fn roll_window(&self, state: &mut BudgetState) {
        let window = self.current_window();
        if state.window != window {
            state.window = window;
            state.used = 0;
        }
    }

    fn current_window(&self) -> u64 {
        (self.epoch.elapsed().as_nanos() / self.interval.as_nanos()) as u64
    }

    fn until_next_window(&self) -> Duration {
        let interval = self.interval.as_nanos();
        let into_window = self.epoch.elapsed().as_nanos() % interval;
        Duration::from_nanos((interval - into_window) as u64)
    }
}

fn spawn_reset_tick(budget: Weak<RateBudget>, epoch: Instant, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval_at(epoch + interval, interval);
        loop {
            ticker.tick().await;
            let Some(budget) = budget.upgrade() else {
                break;
            };
            budget.reset().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_grants_up_to_limit_without_waiting() {
        let budget = RateBudget::new(1200, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..60 {
            budget.reserve(20).await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(budget.used().await, 1200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_waits_for_remainder_of_window() {
        let budget = RateBudget::new(100, Duration::from_secs(60));

        sleep(Duration::from_secs(45)).await;
        for _ in 0..5 {
            budget.reserve(20).await;
        }

        let start = Instant::now();
        budget.reserve(20).await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_secs(15), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(16), "waited {:?}", waited);
        assert_eq!(budget.used().await, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_granted_weight_never_exceeds_limit_within_window() {
        let budget = RateBudget::new(1200, Duration::from_secs(60));
        let start = Instant::now();
        let mut granted_in_first_window = 0;

        for _ in 0..100 {
            budget.reserve(35).await;
            if start.elapsed() < Duration::from_secs(60) {
                granted_in_first_window += 35;
            }
        }

        assert!(granted_in_first_window <= 1200);
        assert_eq!(granted_in_first_window, 35 * (1200 / 35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_tick_resets_counter() {
        let budget = RateBudget::new(1200, Duration::from_secs(60));
        budget.reserve(500).await;
        assert_eq!(budget.used().await, 500);

        sleep(Duration::from_secs(61)).await;

        assert_eq!(budget.used().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_request_granted_alone() {
        let budget = RateBudget::new(10, Duration::from_secs(60));
        budget.reserve(25).await;
        assert_eq!(budget.used().await, 25);

        let start = Instant::now();
        budget.reserve(1).await;
        assert!(start.elapsed() >= Duration::from_secs(59));
    }
}
