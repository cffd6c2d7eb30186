// TailPane - app/tail.rs
//
// Per-view tail controller: owns at most one live repeating poll
// registration and transitions Idle <-> Tailing.
//
// The token cell is the one piece of state touched by both the presentation
// thread and any concurrent toggle.  It is a mutex-guarded
// `Option<CancellationToken>` mutated only by swap-and-read-previous, never
// by a plain read-then-write, so a racing stop can never leave a displaced
// registration un-cancelled.
//
// Protocol for `start_tailing`: schedule the fresh poll and swap it into
// the cell *before* cancelling whatever token was stored.  At the instant
// the new token becomes visible the old one is still controllable, so a
// concurrent `stop_tailing` always finds a cancellable token in the cell.

use crate::app::scheduler::{CancellationToken, Scheduler};
use crate::core::model::TailState;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

struct TailCell {
    state: TailState,
    token: Option<CancellationToken>,
}

/// State machine controlling the repeating poll for one view.
pub struct TailController {
    scheduler: Arc<Scheduler>,
    poll_interval: Duration,

    /// The work performed each poll tick (read appended content and send it
    /// to the presentation channel).  Shared with every registration this
    /// controller creates.
    tick: Arc<dyn Fn() + Send + Sync>,

    cell: Mutex<TailCell>,
}

impl TailController {
    pub fn new(
        scheduler: Arc<Scheduler>,
        poll_interval: Duration,
        tick: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            scheduler,
            poll_interval,
            tick: Arc::new(tick),
            cell: Mutex::new(TailCell {
                state: TailState::Idle,
                token: None,
            }),
        }
    }

    /// Begin (or restart) following the source.
    ///
    /// Safe to call while already Tailing: the previous registration is
    /// cancelled and the fresh one takes over.  The cell lock is held
    /// across schedule-and-swap so two racing starts serialise completely;
    /// the displaced token is cancelled after the swap.
    pub fn start_tailing(&self) {
        tracing::debug!("Starting tailing");

        let mut cell = self.lock_cell();
        let tick = Arc::clone(&self.tick);
        let fresh = self
            .scheduler
            .schedule_repeating(move || tick(), self.poll_interval);
        let previous = cell.token.replace(fresh);
        cell.state = TailState::Tailing;
        drop(cell);

        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Stop following the source.  Idempotent: stopping an Idle controller
    /// touches no token.
    pub fn stop_tailing(&self) {
        tracing::debug!("Stopping tailing");

        let mut cell = self.lock_cell();
        cell.state = TailState::Idle;
        let previous = cell.token.take();
        drop(cell);

        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    pub fn is_tailing(&self) -> bool {
        self.tail_state() == TailState::Tailing
    }

    pub fn tail_state(&self) -> TailState {
        self.lock_cell().state
    }

    fn lock_cell(&self) -> std::sync::MutexGuard<'_, TailCell> {
        // A panic while holding the lock leaves the cell in a consistent
        // state (the swap is a single assignment), so continue with it.
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TailController {
    fn drop(&mut self) {
        // A dropped controller must not leave its poll running.
        self.stop_tailing();
    }
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn controller(scheduler: &Arc<Scheduler>) -> TailController {
        TailController::new(Arc::clone(scheduler), Duration::from_millis(10), || {})
    }

    fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    /// Stopping an Idle controller is a no-op: no token is ever created.
    #[test]
    fn test_stop_while_idle_is_a_no_op() {
        let scheduler = Arc::new(Scheduler::new());
        let tail = controller(&scheduler);

        tail.stop_tailing();
        tail.stop_tailing();

        assert_eq!(tail.tail_state(), TailState::Idle);
        assert_eq!(scheduler.active_task_count(), 0);
    }

    /// start; start in immediate succession leaves exactly one live
    /// registration — the first is cancelled by the second.
    #[test]
    fn test_rapid_double_start_leaves_one_live_registration() {
        let scheduler = Arc::new(Scheduler::new());
        let tail = controller(&scheduler);

        tail.start_tailing();
        tail.start_tailing();

        assert!(tail.is_tailing());
        assert_eq!(scheduler.active_task_count(), 1);

        tail.stop_tailing();
        assert_eq!(scheduler.active_task_count(), 0);
    }

    /// After any sequence of toggles, at most one registration is live.
    #[test]
    fn test_at_most_one_live_registration_across_toggles() {
        let scheduler = Arc::new(Scheduler::new());
        let tail = controller(&scheduler);

        let script: &[bool] = &[
            true, true, false, true, false, false, true, true, true, false,
        ];
        for &start in script {
            if start {
                tail.start_tailing();
            } else {
                tail.stop_tailing();
            }
            assert!(
                scheduler.active_task_count() <= 1,
                "more than one live registration after a completed toggle"
            );
            assert_eq!(tail.is_tailing(), scheduler.active_task_count() == 1);
        }

        tail.stop_tailing();
        assert_eq!(scheduler.active_task_count(), 0);
    }

    /// Ticks actually fire while Tailing and stop after stop_tailing.
    #[test]
    fn test_ticks_fire_while_tailing() {
        let scheduler = Arc::new(Scheduler::new());
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let tail = TailController::new(
            Arc::clone(&scheduler),
            Duration::from_millis(10),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tail.start_tailing();
        assert!(
            wait_until(Duration::from_secs(5), || ticks.load(Ordering::SeqCst) >= 2),
            "expected ticks while tailing"
        );

        tail.stop_tailing();
        std::thread::sleep(Duration::from_millis(150));
        let settled = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(ticks.load(Ordering::SeqCst), settled);
    }

    /// Toggling from many threads at once never accumulates registrations.
    #[test]
    fn test_concurrent_toggling_never_leaks_registrations() {
        let scheduler = Arc::new(Scheduler::new());
        let tail = Arc::new(controller(&scheduler));

        let mut handles = Vec::new();
        for worker in 0..4 {
            let tail = Arc::clone(&tail);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    if (i + worker) % 3 == 0 {
                        tail.stop_tailing();
                    } else {
                        tail.start_tailing();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(scheduler.active_task_count() <= 1);
        tail.stop_tailing();
        assert_eq!(scheduler.active_task_count(), 0);
    }

    /// Dropping the controller cancels its registration.
    #[test]
    fn test_drop_cancels_registration() {
        let scheduler = Arc::new(Scheduler::new());
        {
            let tail = controller(&scheduler);
            tail.start_tailing();
            assert_eq!(scheduler.active_task_count(), 1);
        }
        assert_eq!(scheduler.active_task_count(), 0);
    }
}
