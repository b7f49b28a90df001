//! Timers that drive notification timeouts
//!
//! [`TokioTimer`] is the production implementation. [`ManualTimer`] holds callbacks
//! until a test fires them, which keeps celebration timing deterministic.
//!
//! Contract for implementors: `schedule` must never run the callback before it
//! returns.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Work to run when a timer elapses
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancels a scheduled callback. Cancelling after it ran is a no-op.
pub trait TimerHandle: Send {
    fn cancel(&self);
}

/// Schedules one-shot callbacks
pub trait Timer: Send + Sync {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> Box<dyn TimerHandle>;
}

/// Spawns a sleeping task per timeout on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioTimer {
    runtime: Handle,
}

impl TokioTimer {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Timer on the runtime of the calling task, if there is one
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

struct TokioTimerHandle(JoinHandle<()>);

impl TimerHandle for TokioTimerHandle {
    fn cancel(&self) {
        self.0.abort();
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            callback();
        });
        Box::new(TokioTimerHandle(task))
    }
}

struct PendingTimer {
    id: u64,
    after: Duration,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualTimerState {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

/// Timer that only fires when told to, oldest first
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks scheduled and neither fired nor cancelled
    pub fn pending_count(&self) -> usize {
        self.state.lock().expect("timer lock").pending.len()
    }

    /// Requested delays of the pending callbacks, oldest first
    pub fn pending_delays(&self) -> Vec<Duration> {
        let state = self.state.lock().expect("timer lock");
        state.pending.iter().map(|p| p.after).collect()
    }

    /// Run the oldest pending callback. Returns false if nothing was pending.
    pub fn fire_next(&self) -> bool {
        let next = {
            let mut state = self.state.lock().expect("timer lock");
            if state.pending.is_empty() {
                None
            } else {
                Some(state.pending.remove(0))
            }
        };

        match next {
            Some(timer) => {
                (timer.callback)();
                true
            }
            None => false,
        }
    }

    /// Fire until nothing is pending, including callbacks scheduled while firing.
    /// Returns how many ran.
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }
}

struct ManualTimerHandle {
    id: u64,
    state: Arc<Mutex<ManualTimerState>>,
}

impl TimerHandle for ManualTimerHandle {
    fn cancel(&self) {
        let mut state = self.state.lock().expect("timer lock");
        state.pending.retain(|p| p.id != self.id);
    }
}

impl Timer for ManualTimer {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let mut state = self.state.lock().expect("timer lock");
        let id = state.next_id;
        state.next_id += 1;
        state.pending.push(PendingTimer {
            id,
            after,
            callback,
        });

        Box::new(ManualTimerHandle {
            id,
            state: self.state.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_manual_timer_fires_in_order_and_cancels() {
        let timer = ManualTimer::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        timer.schedule(Duration::from_millis(10), Box::new(move || l.lock().unwrap().push(1)));
        let l = log.clone();
        let second =
            timer.schedule(Duration::from_millis(20), Box::new(move || l.lock().unwrap().push(2)));
        let l = log.clone();
        timer.schedule(Duration::from_millis(30), Box::new(move || l.lock().unwrap().push(3)));

        second.cancel();
        assert_eq!(
            timer.pending_delays(),
            vec![Duration::from_millis(10), Duration::from_millis(30)]
        );
        assert_eq!(timer.fire_all(), 2);
        assert_eq!(*log.lock().unwrap(), vec![1, 3]);
        assert!(!timer.fire_next());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_fires_after_delay() {
        let timer = TokioTimer::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        timer.schedule(
            Duration::from_millis(5000),
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_cancel() {
        let timer = TokioTimer::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        let handle = timer.schedule(
            Duration::from_millis(100),
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
        );
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
