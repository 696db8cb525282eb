//! Global admission gate for outbound LLM work.
//!
//! Built on a tokio [`Semaphore`], so waiting for a slot suspends only the
//! calling task. The permit is an RAII guard: it is returned and the request
//! is accounted on every exit path, cancellation included.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use edubot_types::GateStats;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

pub struct AdmissionGate {
    semaphore: Semaphore,
    capacity: usize,
    total_attempted: AtomicU64,
    total_failed: AtomicU64,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            total_attempted: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }

    /// Waits until a slot is free. No timeout of its own; the caller's
    /// end-to-end deadline bounds the wait.
    ///
    /// The returned permit counts as failed unless [`AdmissionPermit::succeed`]
    /// is called before it drops.
    pub async fn acquire(&self) -> AdmissionPermit<'_> {
        // The semaphore is never closed, so acquire cannot fail here.
        let permit = self.semaphore.acquire().await.ok();
        self.total_attempted.fetch_add(1, Ordering::Relaxed);
        debug!(in_flight = self.in_flight(), capacity = self.capacity, "Admission granted");
        AdmissionPermit { _permit: permit, failed: &self.total_failed, succeeded: false }
    }

    /// Runs `operation` inside one admission slot.
    ///
    /// An `Err` result, or the future being dropped mid-flight, increments
    /// the failure counter.
    pub async fn run<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let permit = self.acquire().await;
        let result = operation.await;
        if result.is_ok() {
            permit.succeed();
        }
        result
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.capacity.saturating_sub(self.semaphore.available_permits())
    }

    /// Counters are read independently; not a strict snapshot.
    pub fn stats(&self) -> GateStats {
        let total_attempted = self.total_attempted.load(Ordering::Relaxed);
        let total_failed = self.total_failed.load(Ordering::Relaxed);
        GateStats {
            total_attempted,
            total_failed,
            success_rate: GateStats::success_rate(total_attempted, total_failed),
            capacity: self.capacity,
            in_flight: self.in_flight(),
        }
    }
}

/// One held admission slot.
pub struct AdmissionPermit<'a> {
    _permit: Option<SemaphorePermit<'a>>,
    failed: &'a AtomicU64,
    succeeded: bool,
}

impl AdmissionPermit<'_> {
    /// Marks the admitted operation as successful and releases the slot.
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        if !self.succeeded {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
