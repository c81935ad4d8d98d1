// File: ./src/debounce.rs
// Cancellable delayed task used for search-as-you-type.
//
// `schedule` arms a timer; scheduling again before it fires aborts the pending
// run, so within a burst only the last scheduled call executes.
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `job` after the delay unless another call replaces it first.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            job.await;
        }));
    }

    /// Drops the pending run, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Waits for the pending run to finish. Returns immediately if nothing
    /// is scheduled or the run was cancelled.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn test_last_call_wins() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        assert_eq!(debouncer.delay(), Duration::from_millis(300));

        for pattern in ["e", "ex", "exa", "exam"] {
            let seen = seen.clone();
            debouncer.schedule(async move {
                seen.lock().unwrap().push(pattern);
            });
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        debouncer.flush().await;
        assert_eq!(*seen.lock().unwrap(), vec!["exam"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_run() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        for pattern in ["a", "b"] {
            let seen = seen.clone();
            debouncer.schedule(async move {
                seen.lock().unwrap().push(pattern);
            });
            debouncer.flush().await;
        }

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let seen = Arc::new(Mutex::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let counter = seen.clone();
        debouncer.schedule(async move {
            *counter.lock().unwrap() += 1;
        });
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
