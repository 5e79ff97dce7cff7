//! In-flight lock and post-dispatch cooldown for mutating actions.
//!
//! Every mutating call the client makes runs through one of these:
//!
//! - [`InFlightLock`] turns a second invocation into a no-op while the first
//!   is still outstanding. The permit is released on drop, so success, error,
//!   early return and a dropped future all unlock exactly once.
//! - [`Cooldown`] blocks re-dispatch for a fixed window after a successful
//!   send (OTP e-mails are slow to arrive and users click again).
//! - [`RequestGuard`] combines the two for actions that need both.
//!
//! The clock is an injectable `Fn() -> i64` returning epoch-milliseconds so
//! tests control time without sleeping.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use rdk_api::ApiError;

/// Default cooldown after a successful OTP dispatch.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Wall clock in epoch-milliseconds.
pub fn system_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What happened to a guarded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    Completed(T),
    Failed(ApiError),
    /// Another invocation holds the lock; nothing was sent.
    Busy,
    /// Dispatch refused until the cooldown window elapses; nothing was sent.
    CoolingDown { remaining_ms: i64 },
}

impl<T> GuardOutcome<T> {
    /// `true` when the action actually ran (successfully or not).
    pub fn dispatched(&self) -> bool {
        matches!(self, GuardOutcome::Completed(_) | GuardOutcome::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// InFlightLock
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InFlightLock {
    held: AtomicBool,
    releases: AtomicU64,
}

/// Proof of holding an [`InFlightLock`]. Releases it on drop.
#[derive(Debug)]
pub struct InFlightPermit<'a> {
    lock: &'a InFlightLock,
}

impl InFlightLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another permit is alive.
    pub fn try_acquire(&self) -> Option<InFlightPermit<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightPermit { lock: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Number of permits released so far.
    pub fn release_count(&self) -> u64 {
        self.releases.load(Ordering::Acquire)
    }

    /// Run `action` under the lock, or report `Busy` without running it.
    pub async fn run<T, F, Fut>(&self, action: F) -> GuardOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Some(_permit) = self.try_acquire() else {
            return GuardOutcome::Busy;
        };
        match action().await {
            Ok(v) => GuardOutcome::Completed(v),
            Err(e) => GuardOutcome::Failed(e),
        }
    }
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
        self.lock.releases.fetch_add(1, Ordering::AcqRel);
    }
}

// ---------------------------------------------------------------------------
// Cooldown
// ---------------------------------------------------------------------------

const NOT_STARTED: i64 = i64::MIN;

pub struct Cooldown<C>
where
    C: Fn() -> i64,
{
    window_ms: i64,
    /// Epoch-ms of the last `start()`, or `NOT_STARTED`.
    started_at_ms: AtomicI64,
    clock: C,
}

impl<C: Fn() -> i64> Cooldown<C> {
    pub fn new(window: Duration, clock: C) -> Self {
        Self {
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            started_at_ms: AtomicI64::new(NOT_STARTED),
            clock,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn start(&self) {
        self.started_at_ms.store((self.clock)(), Ordering::Release);
    }

    pub fn clear(&self) {
        self.started_at_ms.store(NOT_STARTED, Ordering::Release);
    }

    /// Milliseconds left in the window; `0` when not cooling.
    pub fn remaining_ms(&self) -> i64 {
        let started = self.started_at_ms.load(Ordering::Acquire);
        if started == NOT_STARTED {
            return 0;
        }
        let elapsed = (self.clock)().saturating_sub(started);
        self.window_ms.saturating_sub(elapsed).max(0)
    }

    pub fn is_cooling(&self) -> bool {
        self.remaining_ms() > 0
    }
}

impl<C: Fn() -> i64> std::fmt::Debug for Cooldown<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cooldown")
            .field("window_ms", &self.window_ms)
            .field("remaining_ms", &self.remaining_ms())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RequestGuard
// ---------------------------------------------------------------------------

/// In-flight lock plus cooldown for one user-facing action.
pub struct RequestGuard<C>
where
    C: Fn() -> i64,
{
    lock: InFlightLock,
    cooldown: Cooldown<C>,
}

impl<C: Fn() -> i64> std::fmt::Debug for RequestGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGuard")
            .field("lock", &self.lock)
            .field("cooldown", &self.cooldown)
            .finish()
    }
}

impl<C: Fn() -> i64> RequestGuard<C> {
    pub fn new(cooldown: Duration, clock: C) -> Self {
        Self {
            lock: InFlightLock::new(),
            cooldown: Cooldown::new(cooldown, clock),
        }
    }

    pub fn lock(&self) -> &InFlightLock {
        &self.lock
    }

    pub fn cooldown(&self) -> &Cooldown<C> {
        &self.cooldown
    }

    /// Run under the lock only. The cooldown is neither checked nor started.
    pub async fn run<T, F, Fut>(&self, action: F) -> GuardOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.lock.run(action).await
    }

    /// Run under the lock if the cooldown has elapsed; start the cooldown
    /// when the action succeeds. A failed action leaves it untouched.
    pub async fn run_dispatch<T, F, Fut>(&self, action: F) -> GuardOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if self.lock.is_held() {
            return GuardOutcome::Busy;
        }
        let remaining_ms = self.cooldown.remaining_ms();
        if remaining_ms > 0 {
            return GuardOutcome::CoolingDown { remaining_ms };
        }
        let outcome = self.lock.run(action).await;
        if matches!(outcome, GuardOutcome::Completed(_)) {
            self.cooldown.start();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn manual_clock(start: i64) -> (Rc<Cell<i64>>, impl Fn() -> i64) {
        let now = Rc::new(Cell::new(start));
        let handle = Rc::clone(&now);
        (now, move || handle.get())
    }

    #[test]
    fn permit_releases_on_drop_exactly_once() {
        let lock = InFlightLock::new();
        let permit = lock.try_acquire().expect("first acquire");
        assert!(lock.try_acquire().is_none());
        drop(permit);
        assert!(!lock.is_held());
        assert_eq!(lock.release_count(), 1);
        assert!(lock.try_acquire().is_some());
        assert_eq!(lock.release_count(), 2);
    }

    #[test]
    fn cooldown_counts_down_with_injected_clock() {
        let (now, clock) = manual_clock(1_000);
        let cd = Cooldown::new(Duration::from_secs(30), clock);
        assert!(!cd.is_cooling());

        cd.start();
        now.set(6_000);
        assert_eq!(cd.remaining_ms(), 25_000);

        now.set(31_000);
        assert!(!cd.is_cooling());
        assert_eq!(cd.remaining_ms(), 0);
    }

    #[test]
    fn cleared_cooldown_is_not_cooling() {
        let (_now, clock) = manual_clock(0);
        let cd = Cooldown::new(Duration::from_secs(30), clock);
        cd.start();
        assert!(cd.is_cooling());
        cd.clear();
        assert!(!cd.is_cooling());
    }

    #[tokio::test]
    async fn second_invocation_while_outstanding_is_busy() {
        let (_now, clock) = manual_clock(0);
        let guard = RequestGuard::new(Duration::from_secs(30), clock);
        let calls = Cell::new(0u32);
        let calls = &calls;

        let slow = guard.run(move || async move {
            calls.set(calls.get() + 1);
            tokio::task::yield_now().await;
            Ok::<_, ApiError>("sent")
        });
        let fast = guard.run(move || async move {
            calls.set(calls.get() + 1);
            Ok::<_, ApiError>("sent")
        });
        let (a, b) = tokio::join!(slow, fast);

        assert_eq!(a, GuardOutcome::Completed("sent"));
        assert_eq!(b, GuardOutcome::Busy);
        assert_eq!(calls.get(), 1);
        assert!(!guard.lock().is_held());
        assert_eq!(guard.lock().release_count(), 1);
    }

    #[tokio::test]
    async fn failure_releases_lock_and_skips_cooldown() {
        let (_now, clock) = manual_clock(0);
        let guard = RequestGuard::new(Duration::from_secs(30), clock);

        let out = guard
            .run_dispatch(|| async { Err::<(), _>(ApiError::server(500, "mail down")) })
            .await;
        assert_eq!(out, GuardOutcome::Failed(ApiError::server(500, "mail down")));
        assert!(!guard.lock().is_held());
        assert!(!guard.cooldown().is_cooling());
    }

    #[tokio::test]
    async fn dispatch_within_window_is_refused() {
        let (now, clock) = manual_clock(0);
        let guard = RequestGuard::new(Duration::from_secs(30), clock);

        let first = guard.run_dispatch(|| async { Ok::<_, ApiError>(()) }).await;
        assert!(first.dispatched());

        now.set(5_000);
        let second = guard.run_dispatch(|| async { Ok::<_, ApiError>(()) }).await;
        assert_eq!(second, GuardOutcome::CoolingDown { remaining_ms: 25_000 });

        now.set(30_000);
        let third = guard.run_dispatch(|| async { Ok::<_, ApiError>(()) }).await;
        assert!(third.dispatched());
    }
}
