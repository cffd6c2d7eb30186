// TailPane - app/scheduler.rs
//
// Background task scheduling: one-shot and fixed-period repeating work.
//
// Architecture:
//   - Each repeating registration runs on its own dedicated thread, so a
//     registration's ticks execute strictly serially and can never overlap.
//   - An `Arc<AtomicBool>` cancel flag is shared between the worker thread
//     and the `CancellationToken` handed back to the caller.
//   - The poll loop sleeps in small sub-intervals so cancellation takes
//     effect within CANCEL_CHECK_INTERVAL_MS of the flag being set.
//   - Results are never delivered here: actions send their own messages
//     over mpsc channels to the presentation thread (same pattern across
//     all background work in this crate).
//
// Cancellation only prevents future ticks from firing; an in-flight tick
// runs to completion.  Callers must not assume synchronous stop.

use crate::util::constants::CANCEL_CHECK_INTERVAL_MS;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

// =============================================================================
// Cancellation token
// =============================================================================

/// Handle to one scheduled repeating activity.
///
/// `cancel` is idempotent and safe to call from any thread.  Once cancelled
/// the token is permanently inert: the worker thread exits at its next
/// cancel check and no further ticks fire.
#[derive(Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    /// Stop the activity this token controls.  Safe to call repeatedly.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Executes one-shot and fixed-period repeating activities on background
/// threads.
///
/// The scheduler is shared behind an `Arc` by every tail controller.  Its
/// only mutable state is the registry of live cancel flags, used by
/// `shutdown` and by `active_task_count`.
pub struct Scheduler {
    /// Set once by `shutdown`; scheduling afterwards is a programmer error.
    shut_down: AtomicBool,

    /// Weak references to the cancel flags of repeating registrations.
    /// Pruned opportunistically; a flag outlives its thread only while a
    /// token still holds it.
    registrations: Mutex<Vec<Weak<AtomicBool>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shut_down: AtomicBool::new(false),
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Schedule `action` to run every `period` on a dedicated background
    /// thread until the returned token is cancelled.
    ///
    /// The first tick fires one full period after registration, matching a
    /// poll loop that sleeps before each read.
    ///
    /// # Panics
    ///
    /// Panics if called after `shutdown` — scheduling on a dead scheduler
    /// is a programmer error and must fail fast rather than be swallowed.
    pub fn schedule_repeating(
        &self,
        mut action: impl FnMut() + Send + 'static,
        period: Duration,
    ) -> CancellationToken {
        self.assert_live("schedule_repeating");

        let cancelled = Arc::new(AtomicBool::new(false));
        self.register(&cancelled);

        let flag = Arc::clone(&cancelled);
        std::thread::spawn(move || {
            loop {
                if sleep_until_cancelled(period, &flag) {
                    break;
                }
                action();
            }
            tracing::trace!("Repeating task thread exited");
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "Repeating task scheduled");
        CancellationToken::new(cancelled)
    }

    /// Run `action` once on a background thread.
    ///
    /// # Panics
    ///
    /// Panics if called after `shutdown`.
    pub fn run_async(&self, action: impl FnOnce() + Send + 'static) {
        self.assert_live("run_async");
        std::thread::spawn(action);
    }

    /// Cancel every live repeating registration and refuse further
    /// scheduling.  Idempotent.  Worker threads exit within
    /// `CANCEL_CHECK_INTERVAL_MS`; an in-flight tick completes first.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return; // already shut down
        }

        let mut registrations = lock(&self.registrations);
        let mut cancelled = 0usize;
        for weak in registrations.drain(..) {
            if let Some(flag) = weak.upgrade() {
                if !flag.swap(true, Ordering::SeqCst) {
                    cancelled += 1;
                }
            }
        }
        tracing::info!(cancelled, "Scheduler shut down");
    }

    /// Returns `true` once `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Number of live (not yet cancelled) repeating registrations.
    pub fn active_task_count(&self) -> usize {
        let mut registrations = lock(&self.registrations);
        registrations.retain(|weak| weak.strong_count() > 0);
        registrations
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|flag| !flag.load(Ordering::SeqCst))
            .count()
    }

    fn register(&self, cancelled: &Arc<AtomicBool>) {
        let mut registrations = lock(&self.registrations);
        // Prune entries whose token and thread are both gone.
        registrations.retain(|weak| weak.strong_count() > 0);
        registrations.push(Arc::downgrade(cancelled));
    }

    fn assert_live(&self, operation: &str) {
        assert!(
            !self.is_shut_down(),
            "Scheduler::{operation} called after shutdown"
        );
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleep for `period`, waking every `CANCEL_CHECK_INTERVAL_MS` to check the
/// cancel flag.  Returns `true` if cancellation was observed.
fn sleep_until_cancelled(period: Duration, cancelled: &AtomicBool) -> bool {
    let check = Duration::from_millis(CANCEL_CHECK_INTERVAL_MS);
    let mut remaining = period;
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return true;
        }
        if remaining.is_zero() {
            return false;
        }
        let slice = remaining.min(check);
        std::thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}

/// Lock a mutex, continuing with the inner value if a worker panicked while
/// holding it.  The guarded state is a plain Vec of weak flags, valid in
/// any order of operations.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Unit tests
// =============================================================================
