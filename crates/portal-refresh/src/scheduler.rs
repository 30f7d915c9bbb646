//! Shared auto-refresh scheduler
//!
//! Data fetchers register a named async callback. One interval timer fires
//! every callback of every enabled subscriber concurrently, so all fetchers
//! stay on the same cycle and share one visible countdown. A failing callback
//! only marks its own subscriber; siblings are never cancelled or delayed.
//!
//! Only one cycle runs at a time. A trigger that lands while a cycle is in
//! flight (timer or manual) is dropped, not queued.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use portal_core::RefreshError;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Time between refresh cycles
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// How often the countdown is recomputed
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Error type returned by subscriber callbacks
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Future produced by a subscriber callback
pub type RefreshFuture = Pin<Box<dyn Future<Output = Result<(), CallbackError>> + Send>>;

type Callback = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

// ─── Types ───────────────────────────────────────────────────────────────────

struct Subscriber {
    id: String,
    name: String,
    callback: Callback,
    is_refreshing: bool,
    last_error: Option<RefreshError>,
    enabled: bool,
}

/// Read-only view of a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberInfo {
    pub id: String,
    pub name: String,
    pub is_refreshing: bool,
    pub last_error: Option<String>,
    pub enabled: bool,
}

/// Aggregate scheduler state, published after every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    /// Auto-refresh timers are active
    pub running: bool,
    /// A cycle is executing right now
    pub is_refreshing: bool,
    /// Whole seconds until the next scheduled cycle
    pub countdown: u64,
    /// Some subscriber's last attempt failed
    pub has_errors: bool,
    pub refreshing_count: usize,
    /// Unix milliseconds of the last completed cycle
    pub last_refresh_ms: u64,
}

/// What happened to a requested cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed { succeeded: usize, failed: usize },
    /// Another cycle was already in progress
    Skipped,
}

struct Timers {
    refresh: JoinHandle<()>,
    countdown: JoinHandle<()>,
}

impl Timers {
    fn abort(self) {
        self.refresh.abort();
        self.countdown.abort();
    }
}

struct Clock {
    last_refresh: SystemTime,
    next_refresh: Instant,
}

struct Inner {
    interval: Duration,
    subscribers: Mutex<BTreeMap<String, Subscriber>>,
    cycle_running: AtomicBool,
    clock: Mutex<Clock>,
    countdown: AtomicU64,
    timers: Mutex<Option<Timers>>,
    status_tx: watch::Sender<RefreshStatus>,
}

/// Lock a std mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Inner {
    fn status(&self) -> RefreshStatus {
        let (has_errors, refreshing_count) = {
            let subs = lock(&self.subscribers);
            (
                subs.values().any(|s| s.last_error.is_some()),
                subs.values().filter(|s| s.is_refreshing).count(),
            )
        };
        RefreshStatus {
            running: lock(&self.timers).is_some(),
            is_refreshing: self.cycle_running.load(Ordering::SeqCst),
            countdown: self.countdown.load(Ordering::SeqCst),
            has_errors,
            refreshing_count,
            last_refresh_ms: unix_millis(lock(&self.clock).last_refresh),
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }

    fn recompute_countdown(&self) {
        let next = lock(&self.clock).next_refresh;
        let remaining = next.saturating_duration_since(Instant::now()).as_secs();
        self.countdown.store(remaining, Ordering::SeqCst);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timers) = lock(&self.timers).take() {
            timers.abort();
        }
    }
}

/// Clears the in-progress flag even if the cycle future is dropped
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// Handle returned by [`RefreshScheduler::subscribe`].
///
/// The callback stays registered until [`Subscription::unsubscribe`] is called.
#[must_use = "the callback stays registered until unsubscribe() is called"]
pub struct Subscription {
    id: String,
    scheduler: Weak<Inner>,
    active: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Remove this subscription. Calling it again is a no-op.
    ///
    /// A callback already running in the current cycle is left to finish.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.scheduler.upgrade() {
            lock(&inner.subscribers).remove(&self.id);
            inner.publish();
        }
    }

    /// Pause or resume this subscriber without removing it
    pub fn set_enabled(&self, enabled: bool) {
        if !self.is_active() {
            return;
        }
        if let Some(inner) = self.scheduler.upgrade() {
            if let Some(sub) = lock(&inner.subscribers).get_mut(&self.id) {
                sub.enabled = enabled;
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ─── RefreshScheduler ────────────────────────────────────────────────────────

/// Named-subscriber polling coordinator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        let now = SystemTime::now();
        let clock = Clock {
            last_refresh: now,
            next_refresh: Instant::now() + interval,
        };
        let initial = RefreshStatus {
            running: false,
            is_refreshing: false,
            countdown: interval.as_secs(),
            has_errors: false,
            refreshing_count: 0,
            last_refresh_ms: unix_millis(now),
        };
        let (status_tx, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                interval,
                subscribers: Mutex::new(BTreeMap::new()),
                cycle_running: AtomicBool::new(false),
                clock: Mutex::new(clock),
                countdown: AtomicU64::new(interval.as_secs()),
                timers: Mutex::new(None),
                status_tx,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Register a callback to run on every cycle.
    ///
    /// The subscriber id combines `name`, the issuance time and a random
    /// component, so repeated names never collide.
    pub fn subscribe<F, Fut>(&self, name: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        let name = name.into();
        let id = format!(
            "{}-{}-{}",
            name,
            unix_millis(SystemTime::now()),
            uuid::Uuid::new_v4().simple()
        );
        let callback: Callback = Arc::new(move || Box::pin(callback()) as RefreshFuture);

        lock(&self.inner.subscribers).insert(
            id.clone(),
            Subscriber {
                id: id.clone(),
                name: name.clone(),
                callback,
                is_refreshing: false,
                last_error: None,
                enabled: true,
            },
        );
        tracing::debug!(subscriber = %name, id = %id, "Refresh subscriber added");
        self.inner.publish();

        Subscription {
            id,
            scheduler: Arc::downgrade(&self.inner),
            active: AtomicBool::new(true),
        }
    }

    /// Start the interval and countdown timers.
    ///
    /// Runs one cycle immediately. A no-op while already running. Must be
    /// called from within a Tokio runtime.
    pub fn start_auto_refresh(&self) {
        let mut timers = lock(&self.inner.timers);
        if timers.is_some() {
            return;
        }

        lock(&self.inner.clock).next_refresh = Instant::now() + self.inner.interval;
        self.inner
            .countdown
            .store(self.inner.interval.as_secs(), Ordering::SeqCst);

        let weak = Arc::downgrade(&self.inner);
        *timers = Some(Timers {
            refresh: tokio::spawn(refresh_loop(weak.clone(), self.inner.interval)),
            countdown: tokio::spawn(countdown_loop(weak)),
        });
        drop(timers);

        tracing::debug!(
            interval_ms = self.inner.interval.as_millis() as u64,
            "Auto-refresh started"
        );
        self.inner.publish();
    }

    /// Cancel both timers. Safe to call when not running.
    pub fn stop_auto_refresh(&self) {
        let timers = lock(&self.inner.timers).take();
        if let Some(timers) = timers {
            timers.abort();
            tracing::debug!("Auto-refresh stopped");
            self.inner.publish();
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.timers).is_some()
    }

    /// Run one cycle now, outside the schedule
    pub async fn manual_refresh(&self) -> CycleOutcome {
        self.run_cycle().await
    }

    /// Invoke every enabled subscriber concurrently and wait for all of them
    async fn run_cycle(&self) -> CycleOutcome {
        if self.inner.cycle_running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Refresh already in progress, skipping cycle");
            return CycleOutcome::Skipped;
        }
        let guard = CycleGuard(&self.inner.cycle_running);

        let active: Vec<(String, String, Callback)> = {
            let mut subs = lock(&self.inner.subscribers);
            subs.values_mut()
                .filter(|s| s.enabled)
                .map(|s| {
                    s.is_refreshing = true;
                    s.last_error = None;
                    (s.id.clone(), s.name.clone(), s.callback.clone())
                })
                .collect()
        };
        self.inner.publish();

        let calls = active.into_iter().map(|(id, name, callback)| {
            let fut = callback();
            async move { (id, name, fut.await) }
        });
        let results = join_all(calls).await;

        let mut succeeded = 0;
        let mut failed = 0;
        {
            let mut subs = lock(&self.inner.subscribers);
            for (id, name, result) in results {
                let last_error = match result {
                    Ok(()) => {
                        succeeded += 1;
                        None
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(subscriber = %name, error = %e, "Refresh subscriber failed");
                        Some(RefreshError::SubscriberCallbackFailed {
                            name,
                            message: e.to_string(),
                        })
                    }
                };
                // Unsubscribed mid-cycle: nothing left to update
                if let Some(sub) = subs.get_mut(&id) {
                    sub.is_refreshing = false;
                    sub.last_error = last_error;
                }
            }
        }

        {
            let mut clock = lock(&self.inner.clock);
            clock.last_refresh = SystemTime::now();
            clock.next_refresh = Instant::now() + self.inner.interval;
        }
        self.inner
            .countdown
            .store(self.inner.interval.as_secs(), Ordering::SeqCst);

        drop(guard);
        self.inner.publish();
        tracing::debug!(succeeded, failed, "Refresh cycle completed");

        CycleOutcome::Completed { succeeded, failed }
    }

    /// A cycle is executing right now
    pub fn is_refreshing(&self) -> bool {
        self.inner.cycle_running.load(Ordering::SeqCst)
    }

    /// Whole seconds until the next scheduled cycle
    pub fn countdown(&self) -> u64 {
        self.inner.countdown.load(Ordering::SeqCst)
    }

    pub fn last_refresh_time(&self) -> SystemTime {
        lock(&self.inner.clock).last_refresh
    }

    pub fn has_errors(&self) -> bool {
        lock(&self.inner.subscribers)
            .values()
            .any(|s| s.last_error.is_some())
    }

    pub fn refreshing_count(&self) -> usize {
        lock(&self.inner.subscribers)
            .values()
            .filter(|s| s.is_refreshing)
            .count()
    }

    /// Last error of a subscriber, `None` if it succeeded or is unknown
    pub fn last_error(&self, id: &str) -> Option<RefreshError> {
        lock(&self.inner.subscribers)
            .get(id)
            .and_then(|s| s.last_error.clone())
    }

    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        lock(&self.inner.subscribers)
            .values()
            .map(|s| SubscriberInfo {
                id: s.id.clone(),
                name: s.name.clone(),
                is_refreshing: s.is_refreshing,
                last_error: s.last_error.as_ref().map(|e| e.to_string()),
                enabled: s.enabled,
            })
            .collect()
    }

    pub fn status(&self) -> RefreshStatus {
        self.inner.status()
    }

    /// Receive a fresh [`RefreshStatus`] whenever it changes
    pub fn watch_status(&self) -> watch::Receiver<RefreshStatus> {
        self.inner.status_tx.subscribe()
    }
}

async fn refresh_loop(inner: Weak<Inner>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let scheduler = RefreshScheduler { inner };
        tokio::spawn(async move {
            scheduler.run_cycle().await;
        });
    }
}

async fn countdown_loop(inner: Weak<Inner>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + COUNTDOWN_TICK, COUNTDOWN_TICK);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.recompute_countdown();
        inner.publish();
    }
}
