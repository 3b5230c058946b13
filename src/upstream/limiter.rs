use crate::error::{SyncError, SyncResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Caps simultaneous upstream calls. Waiters are admitted in arrival order.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_in_flight: usize,
}

impl ConcurrencyLimiter {
    pub fn new(max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn acquire(&self) -> SyncResult<SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| SyncError::UpstreamUnavailable("concurrency limiter closed".to_string()))
    }

    /// Run `fut` while holding a slot.
    pub async fn run<T, F>(&self, fut: F) -> SyncResult<T>
    where
        F: Future<Output = SyncResult<T>>,
    {
        let _permit = self.acquire().await?;
        fut.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_never_exceeds_ceiling() {
        let limiter = ConcurrencyLimiter::new(5);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .run(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 5);
        assert_eq!(limiter.available(), 5);
    }

    #[tokio::test]
    async fn test_queued_calls_admitted_in_order() {
        let limiter = ConcurrencyLimiter::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let held = limiter.acquire().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..5 {
            let limiter = limiter.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                limiter
                    .run(async {
                        order.lock().await.push(i);
                        Ok(())
                    })
                    .await
            }));
            // Let the task reach the semaphore queue before spawning the next.
            tokio::task::yield_now().await;
        }

        drop(held);
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);
    }
}
