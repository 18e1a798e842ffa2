//! One named slot of upstream data with TTL, single-flight refresh, and fallback on error.
//!
//! [`CacheEntry`] wraps a [`SnapshotSource`] and remembers the last snapshot the source
//! produced successfully. Callers always get a value back: a fresh snapshot when one is
//! cached, otherwise the result of a refresh, otherwise the previous snapshot, otherwise
//! the source's empty default. Upstream failures never reach the caller.
//!
//! Concurrent callers that find the entry stale share one pending refresh. The pending
//! refresh is stored in the entry as a [`Shared`] future, and the check-and-set happens
//! under the entry's lock, so no two refreshes of the same entry ever overlap.

use super::upstream::UpstreamError;
use core::fmt::{Debug, Formatter};
use core::time::Duration;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const LOG_TARGET: &str = "     cache";

/// Something that can produce a complete snapshot of one resource.
pub trait SnapshotSource: Send + Sync + 'static {
    type Snapshot: Send + Sync + 'static;

    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Fetch and normalize a complete snapshot from the upstream.
    fn load(&self) -> impl Future<Output = Result<Self::Snapshot, UpstreamError>> + Send;

    /// The value served when nothing was ever loaded successfully.
    fn empty(&self) -> Self::Snapshot;
}

/// Where an entry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never loaded successfully, nothing in flight.
    Empty,

    /// A refresh is in flight.
    Fetching,

    /// Holds a snapshot younger than the TTL.
    Fresh,

    /// Holds a snapshot older than the TTL.
    Stale,
}

type PendingRefresh<T> = Shared<BoxFuture<'static, Arc<T>>>;

struct Slot<T> {
    data: Option<Arc<T>>,
    fetched_at: Option<Instant>,
    in_flight: Option<PendingRefresh<T>>,
}

impl<T> Slot<T> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.data.is_some() && self.fetched_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

struct Inner<S: SnapshotSource> {
    source: S,
    ttl: Duration,
    log_failures: bool,
    slot: Mutex<Slot<S::Snapshot>>,
}

pub struct CacheEntry<S: SnapshotSource> {
    inner: Arc<Inner<S>>,
}

impl<S: SnapshotSource> Clone for CacheEntry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SnapshotSource> Debug for CacheEntry<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("name", &self.inner.source.name())
            .field("ttl", &self.inner.ttl)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<S: SnapshotSource> CacheEntry<S> {
    /// Create an empty entry. Refresh failures are logged only when `log_failures` is set.
    #[must_use]
    pub fn new(source: S, ttl: Duration, log_failures: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                ttl,
                log_failures,
                slot: Mutex::new(Slot {
                    data: None,
                    fetched_at: None,
                    in_flight: None,
                }),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.source.name()
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Return the snapshot, refreshing it first when it is stale, missing, or `force` is set.
    ///
    /// A refresh already in flight is joined rather than duplicated, even when `force` is set.
    pub async fn get(&self, force: bool) -> Arc<S::Snapshot> {
        let pending = {
            let mut slot = self.inner.slot.lock().expect("lock not poisoned");

            if !force
                && slot.is_fresh(self.inner.ttl)
                && let Some(data) = &slot.data
            {
                return Arc::clone(data);
            }

            if let Some(in_flight) = &slot.in_flight {
                in_flight.clone()
            } else {
                let refresh = Self::refresh(Arc::clone(&self.inner)).boxed().shared();
                slot.in_flight = Some(refresh.clone());
                refresh
            }
        };

        pending.await
    }

    /// The last good snapshot, without any I/O.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<S::Snapshot>> {
        self.inner.slot.lock().expect("lock not poisoned").data.clone()
    }

    #[must_use]
    pub fn state(&self) -> EntryState {
        let slot = self.inner.slot.lock().expect("lock not poisoned");
        if slot.in_flight.is_some() {
            EntryState::Fetching
        } else if slot.data.is_none() {
            EntryState::Empty
        } else if slot.is_fresh(self.inner.ttl) {
            EntryState::Fresh
        } else {
            EntryState::Stale
        }
    }

    /// Time since the last successful refresh.
    #[must_use]
    pub fn age(&self) -> Option<Duration> {
        self.inner.slot.lock().expect("lock not poisoned").fetched_at.map(|at| at.elapsed())
    }

    /// Force a refresh every `interval` on a detached task.
    ///
    /// A zero interval disables background refresh and returns `None`. The task holds only a
    /// weak reference to the entry and ends once the entry is dropped.
    pub fn schedule_background_refresh(&self, interval: Duration) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            return None;
        }

        log::debug!(target: LOG_TARGET, "Refreshing '{}' every {}s in the background", self.name(), interval.as_secs());

        let weak = Arc::downgrade(&self.inner);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let _ = ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };

                let _ = Self { inner }.get(true).await;
            }
        }))
    }

    async fn refresh(inner: Arc<Inner<S>>) -> Arc<S::Snapshot> {
        log::debug!(target: LOG_TARGET, "Refreshing '{}'", inner.source.name());
        let result = inner.source.load().await;

        let mut slot = inner.slot.lock().expect("lock not poisoned");
        slot.in_flight = None;

        match result {
            Ok(snapshot) => {
                let data = Arc::new(snapshot);
                slot.data = Some(Arc::clone(&data));
                slot.fetched_at = Some(Instant::now());
                log::debug!(target: LOG_TARGET, "Refreshed '{}'", inner.source.name());
                data
            }

            Err(e) => {
                if inner.log_failures {
                    log::warn!(target: LOG_TARGET, "Could not refresh '{}', serving previous data: {e}", inner.source.name());
                }

                match &slot.data {
                    Some(data) => Arc::clone(data),
                    None => Arc::new(inner.source.empty()),
                }
            }
        }
    }
}
