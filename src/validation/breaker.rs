use std::{
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// Consecutive-failure circuit breaker.
///
/// Closed until `failure_threshold` failures in a row, then open: [`allow`]
/// refuses calls until `reset_timeout` has elapsed, after which a single
/// trial call is let through per window (half-open). Any success closes it.
///
/// [`allow`]: CircuitBreaker::allow
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: usize,
    reset_timeout: Duration,
    failure_count: AtomicUsize,
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    /// A `failure_threshold` of zero disables the breaker.
    #[must_use]
    pub fn new(failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            failure_count: AtomicUsize::new(0),
            opened_at: Mutex::new(None),
        }
    }

    fn opened_at(&self) -> MutexGuard<'_, Option<Instant>> {
        self.opened_at.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call may proceed.
    pub fn allow(&self) -> bool {
        let mut opened_at = self.opened_at();
        match *opened_at {
            None => true,
            Some(at) if at.elapsed() >= self.reset_timeout => {
                // Re-arm so concurrent callers keep failing fast while the
                // trial call is in flight.
                *opened_at = Some(Instant::now());
                debug!("Circuit half-open, allowing a trial call");
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Release);
        if self.opened_at().take().is_some() {
            debug!("Circuit closed");
        }
    }

    pub fn record_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
        if self.failure_threshold == 0 || failures < self.failure_threshold {
            return;
        }

        let mut opened_at = self.opened_at();
        if opened_at.is_none() {
            warn!(
                failures,
                reset_timeout_ms = self.reset_timeout.as_millis(),
                "Circuit opened"
            );
        }
        *opened_at = Some(Instant::now());
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.opened_at()
            .is_some_and(|at| at.elapsed() < self.reset_timeout)
    }
}
