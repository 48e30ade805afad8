use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Single-shot delayed task that coalesces bursts.
///
/// Each `schedule` aborts the pending task and starts a fresh countdown, so a
/// burst of calls produces one run, `delay` after the last call. The
/// generation token covers the window where a task has already woken up but
/// has not run yet when it gets superseded or cancelled.
pub struct Debouncer {
    delay: Duration,
    runtime: Option<Handle>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Without a runtime there is nothing to defer on and tasks run inline
    pub fn new(delay: Duration, runtime: Option<Handle>) -> Self {
        Self {
            delay,
            runtime,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);

        let Some(runtime) = self.runtime.as_ref() else {
            self.abort_pending();
            task();
            return;
        };

        let delay = self.delay;
        let generation = Arc::clone(&self.generation);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == token {
                task();
            }
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending task, if any. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_pending()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn abort_pending(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
