use chrono::{DateTime, Utc};
use core::time::Duration;
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::Instant;

/// Longest pause honored after the upstream reports an exhausted quota.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(3600);

/// Bounds concurrent upstream requests and remembers rate-limit pauses.
///
/// Callers hold the permit returned by [`Throttler::acquire`] for the duration of one
/// request. A pause does not park callers: it only makes [`Throttler::paused_until`]
/// report the reset time so that requests can fail fast instead of hammering an
/// endpoint that already refused them.
///
/// When several pauses overlap, the longest one wins.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Semaphore,
    resume: Mutex<Option<(Instant, DateTime<Utc>)>>,
}

impl Throttler {
    /// Create a throttler allowing at most `max_concurrent` requests at a time.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Semaphore::new(max_concurrent.max(1)),
            resume: Mutex::new(None),
        })
    }

    /// Wait for a free request slot.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore.acquire().await.expect("semaphore is never closed")
    }

    /// The wall-clock time at which the current pause ends, if one is active.
    #[must_use]
    pub fn paused_until(&self) -> Option<DateTime<Utc>> {
        let mut guard = self.resume.lock().expect("lock not poisoned");
        let current = *guard;
        match current {
            Some((at, reset_at)) if Instant::now() < at => Some(reset_at),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }

    /// Pause until the upstream's advertised `reset_at`, capped at one hour.
    ///
    /// Returns `true` only when this call established or extended the pause.
    pub fn pause_until(&self, reset_at: DateTime<Utc>) -> bool {
        let wait = (reset_at - Utc::now()).to_std().unwrap_or(Duration::ZERO).min(MAX_RATE_LIMIT_WAIT);
        if wait.is_zero() {
            return false;
        }

        let resume_at = Instant::now() + wait;
        let mut guard = self.resume.lock().expect("lock not poisoned");
        if guard.is_some_and(|(existing, _)| existing >= resume_at) {
            return false;
        }
        *guard = Some((resume_at, reset_at));
        true
    }
}
