// LogSift - app/debounce.rs
//
// Trailing-edge debounce for filter/search requests driven by typing.
//
// Architecture:
//   - A timer thread owns the wait; callers only swap the pending action
//     under a mutex and poke the condvar.
//   - Each `execute` replaces the pending action and pushes its deadline to
//     now + interval. The action that is pending when a deadline passes
//     untouched runs exactly once, on the timer thread.
//   - Actions are expected to be cheap hand-offs (e.g. queue a job on the
//     session worker); the timer thread never touches session state.
//   - Dropping the executor discards any pending action and joins the thread.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

type Action = Box<dyn FnOnce() + Send + 'static>;

struct Pending {
    action: Action,
    deadline: Instant,
}

#[derive(Default)]
struct Slot {
    pending: Option<Pending>,
    shutdown: bool,
}

type Shared = Arc<(Mutex<Slot>, Condvar)>;

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coalesces bursts of calls into one delayed execution of the last action.
pub struct DebouncedExecutor {
    interval: Duration,
    shared: Shared,
    timer: Option<JoinHandle<()>>,
}

impl DebouncedExecutor {
    pub fn new(interval: Duration) -> Self {
        let shared: Shared = Arc::new((Mutex::new(Slot::default()), Condvar::new()));
        let timer_shared = Arc::clone(&shared);
        let timer = std::thread::spawn(move || run_timer(timer_shared));

        Self {
            interval,
            shared,
            timer: Some(timer),
        }
    }

    /// Quiet interval that must pass without calls before an action runs.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule `action`, replacing any pending one and restarting the quiet
    /// interval.
    pub fn execute(&self, action: impl FnOnce() + Send + 'static) {
        let (slot, wake) = &*self.shared;
        let replaced = lock(slot)
            .pending
            .replace(Pending {
                action: Box::new(action),
                deadline: Instant::now() + self.interval,
            })
            .is_some();
        wake.notify_one();

        tracing::trace!(replaced, "Debounced action scheduled");
    }

    /// True while an action is waiting for its quiet interval to elapse.
    pub fn is_pending(&self) -> bool {
        lock(&self.shared.0).pending.is_some()
    }
}

impl Drop for DebouncedExecutor {
    fn drop(&mut self) {
        let (slot, wake) = &*self.shared;
        {
            let mut slot = lock(slot);
            slot.shutdown = true;
            if slot.pending.take().is_some() {
                tracing::debug!("Debouncer dropped with a pending action; discarded");
            }
        }
        wake.notify_one();

        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                tracing::error!("Debounce timer thread panicked");
            }
        }
    }
}

fn run_timer(shared: Shared) {
    let (slot, wake) = &*shared;
    let mut guard = lock(slot);

    loop {
        if guard.shutdown {
            return;
        }

        let Some(deadline) = guard.pending.as_ref().map(|p| p.deadline) else {
            guard = wake.wait(guard).unwrap_or_else(PoisonError::into_inner);
            continue;
        };

        let now = Instant::now();
        if now < deadline {
            // Woken early either by a new call (deadline moved) or spuriously;
            // the loop re-reads the deadline either way.
            guard = wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }

        let due = guard.pending.take();
        drop(guard);
        if let Some(pending) = due {
            (pending.action)();
        }
        guard = lock(slot);
    }
}
