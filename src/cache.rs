//! # Freshness Cache
//! Time-bounded snapshot of one loaded table.
//!
//! A snapshot younger than the freshness window is served without touching
//! the remote source. Expiry is checked on read; nothing is evicted in the
//! background.
//!
//! Failed refreshes never overwrite a snapshot. The last good snapshot keeps
//! being served (tagged [`LoadOutcome::Stale`]) until it is older than
//! `max_stale`; after that the outcome is [`LoadOutcome::Unavailable`] with no
//! records. Failures themselves are not cached, so the next read retries.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::LoadError;

/// Records from one successful fetch plus when they were fetched.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub records: Arc<Vec<T>>,
    pub fetched_at: DateTime<Utc>,
    fetched: Instant,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            fetched_at: self.fetched_at,
            fetched: self.fetched,
        }
    }
}

impl<T> Snapshot<T> {
    fn new(records: Vec<T>, fetched: Instant) -> Self {
        Self {
            records: Arc::new(records),
            fetched_at: Utc::now(),
            fetched,
        }
    }

    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Fresh,
    Cached,
    Stale,
    Unavailable,
}

/// What a loader hands to the presentation layer for one call.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// Fetched from the remote source during this call.
    Fresh(Snapshot<T>),
    /// Served from a snapshot still inside the freshness window.
    Cached(Snapshot<T>),
    /// Refresh failed; last good snapshot served instead.
    Stale { snapshot: Snapshot<T>, error: LoadError },
    /// Refresh failed and nothing usable is cached.
    Unavailable(LoadError),
}

impl<T> Clone for LoadOutcome<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fresh(s) => Self::Fresh(s.clone()),
            Self::Cached(s) => Self::Cached(s.clone()),
            Self::Stale { snapshot, error } => Self::Stale {
                snapshot: snapshot.clone(),
                error: error.clone(),
            },
            Self::Unavailable(e) => Self::Unavailable(e.clone()),
        }
    }
}

impl<T> LoadOutcome<T> {
    /// Records to display; empty when unavailable.
    pub fn records(&self) -> &[T] {
        match self.snapshot() {
            Some(s) => s.records.as_slice(),
            None => &[],
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot<T>> {
        match self {
            Self::Fresh(s) | Self::Cached(s) | Self::Stale { snapshot: s, .. } => Some(s),
            Self::Unavailable(_) => None,
        }
    }

    /// The failure behind a stale or unavailable outcome.
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Stale { error, .. } | Self::Unavailable(error) => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            Self::Fresh(_) => OutcomeStatus::Fresh,
            Self::Cached(_) => OutcomeStatus::Cached,
            Self::Stale { .. } => OutcomeStatus::Stale,
            Self::Unavailable(_) => OutcomeStatus::Unavailable,
        }
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|s| s.fetched_at)
    }
}

/// JSON shape of an outcome for the HTTP layer.
#[derive(Debug, Serialize)]
pub struct OutcomeView<'a, T: Serialize> {
    pub status: OutcomeStatus,
    pub fetched_at: Option<DateTime<Utc>>,
    pub columns: &'static [&'static str],
    pub records: &'a [T],
    pub error_kind: Option<&'static str>,
    pub warning: Option<String>,
}

impl<'a, T: Serialize> OutcomeView<'a, T> {
    /// `columns` is emitted even with zero records so consumers keep a stable schema.
    pub fn new(outcome: &'a LoadOutcome<T>, columns: &'static [&'static str]) -> Self {
        Self {
            status: outcome.status(),
            fetched_at: outcome.fetched_at(),
            columns,
            records: outcome.records(),
            error_kind: outcome.error().map(LoadError::kind),
            warning: outcome.error().map(ToString::to_string),
        }
    }
}

pub struct FreshnessCache<T> {
    table: &'static str,
    window: Duration,
    max_stale: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Snapshot<T>>>,
}

impl<T> FreshnessCache<T> {
    pub fn new(
        table: &'static str,
        window: Duration,
        max_stale: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table,
            window,
            max_stale: max_stale.max(window),
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Serve the snapshot if fresh, otherwise run `refresh` once.
    ///
    /// The slot stays locked while `refresh` runs, so concurrent callers wait
    /// for that fetch instead of starting their own.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> LoadOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, LoadError>>,
    {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(snap) = slot.as_ref() {
            if snap.age(now) < self.window {
                counter!("dashboard_cache_hits_total", "table" => self.table).increment(1);
                return LoadOutcome::Cached(snap.clone());
            }
        }

        match refresh().await {
            Ok(records) => {
                let snap = Snapshot::new(records, now);
                *slot = Some(snap.clone());
                LoadOutcome::Fresh(snap)
            }
            Err(error) => {
                counter!(
                    "dashboard_fetch_errors_total",
                    "table" => self.table,
                    "kind" => error.kind()
                )
                .increment(1);
                match slot.as_ref() {
                    Some(snap) if snap.age(now) < self.max_stale => {
                        counter!("dashboard_stale_served_total", "table" => self.table)
                            .increment(1);
                        tracing::warn!(
                            table = self.table,
                            age_secs = snap.age(now).as_secs(),
                            error = %error,
                            "refresh failed; serving last good snapshot"
                        );
                        LoadOutcome::Stale {
                            snapshot: snap.clone(),
                            error,
                        }
                    }
                    _ => {
                        *slot = None;
                        LoadOutcome::Unavailable(error)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache(clock: Arc<ManualClock>) -> FreshnessCache<u32> {
        FreshnessCache::new(
            "test",
            Duration::from_secs(10),
            Duration::from_secs(60),
            clock,
        )
    }

    #[tokio::test]
    async fn serves_cached_inside_window() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(clock.clone());
        let first = c.get_or_refresh(|| async { Ok(vec![1, 2]) }).await;
        assert_eq!(first.status(), OutcomeStatus::Fresh);

        clock.advance(Duration::from_secs(9));
        let second = c
            .get_or_refresh(|| async { Err(LoadError::fetch("s", "refetched inside window")) })
            .await;
        assert_eq!(second.status(), OutcomeStatus::Cached);
        assert_eq!(second.records(), first.records());
    }

    #[tokio::test]
    async fn failure_within_max_stale_serves_last_good() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(clock.clone());
        c.get_or_refresh(|| async { Ok(vec![7]) }).await;

        clock.advance(Duration::from_secs(30));
        let out = c
            .get_or_refresh(|| async { Err(LoadError::fetch("s", "boom")) })
            .await;
        assert_eq!(out.status(), OutcomeStatus::Stale);
        assert_eq!(out.records(), &[7]);
        assert!(out.error().is_some());
    }

    #[tokio::test]
    async fn failure_beyond_max_stale_is_unavailable() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(clock.clone());
        c.get_or_refresh(|| async { Ok(vec![7]) }).await;

        clock.advance(Duration::from_secs(61));
        let out = c
            .get_or_refresh(|| async { Err(LoadError::fetch("s", "boom")) })
            .await;
        assert_eq!(out.status(), OutcomeStatus::Unavailable);
        assert!(out.records().is_empty());
    }

    #[tokio::test]
    async fn failure_with_nothing_cached_is_unavailable_and_retried() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(clock);
        let out = c
            .get_or_refresh(|| async { Err(LoadError::auth("nope")) })
            .await;
        assert_eq!(out.status(), OutcomeStatus::Unavailable);

        let again = c.get_or_refresh(|| async { Ok(vec![1]) }).await;
        assert_eq!(again.status(), OutcomeStatus::Fresh);
    }
}
