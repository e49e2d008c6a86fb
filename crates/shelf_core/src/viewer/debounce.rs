//! crates/shelf_core/src/viewer/debounce.rs
//!
//! A reusable trailing debouncer with a forced flush. Repeated calls inside
//! the quiet window coalesce into one invocation of the sink, carrying the
//! latest arguments; `flush` short-circuits the wait for teardown paths.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

type Sink<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct Inner<T> {
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
}

/// Trailing debounce around an async sink.
///
/// Each [`call`](Self::call) replaces the pending arguments and re-arms the
/// quiet-window timer, so only the final call in a burst reaches the sink.
/// [`flush`](Self::flush) delivers a pending call immediately and is awaited
/// to completion, which is what teardown paths need.
///
/// Dropping the debouncer does not cancel an armed timer; a pending call
/// still fires on schedule. Callers that must not leave work behind should
/// flush first.
pub struct Debouncer<T: Send + 'static> {
    quiet: Duration,
    sink: Sink<T>,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(quiet: Duration, sink: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            quiet,
            sink: Arc::new(move |args| {
                let fut: BoxFuture<'static, ()> = Box::pin(sink(args));
                fut
            }),
            inner: Arc::new(Mutex::new(Inner {
                pending: None,
                timer: None,
            })),
        }
    }

    /// Schedules the sink with these arguments, superseding any call still
    /// waiting out the quiet window.
    pub async fn call(&self, args: T) {
        let mut inner = self.inner.lock().await;
        inner.pending = Some(args);
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }

        let quiet = self.quiet;
        let sink = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.inner);
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // Take under the lock, sink outside it. If a flush got here
            // first, pending is empty and there is nothing to do.
            let taken = shared.lock().await.pending.take();
            if let Some(args) = taken {
                sink(args).await;
            }
        }));
    }

    /// Delivers the pending call right now, if there is one, and waits for
    /// the sink to finish. The armed timer is only aborted when this call
    /// actually claimed the pending arguments, so an in-flight delivery is
    /// never killed halfway.
    pub async fn flush(&self) {
        let taken = {
            let mut inner = self.inner.lock().await;
            let taken = inner.pending.take();
            if taken.is_some() {
                if let Some(timer) = inner.timer.take() {
                    timer.abort();
                }
            }
            taken
        };
        if let Some(args) = taken {
            (self.sink)(args).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(quiet: Duration) -> (Debouncer<u32>, Arc<Mutex<Vec<u32>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let sink_writes = Arc::clone(&writes);
        let debouncer = Debouncer::new(quiet, move |v: u32| {
            let writes = Arc::clone(&sink_writes);
            async move {
                writes.lock().await.push(v);
            }
        });
        (debouncer, writes)
    }

    /// Lets spawned timer tasks run to completion under the paused clock.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_call_in_a_burst_reaches_the_sink() {
        let (debouncer, writes) = recording(Duration::from_secs(3));

        debouncer.call(1).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        debouncer.call(2).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        debouncer.call(3).await;
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;

        assert_eq!(*writes.lock().await, vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn each_call_restarts_the_quiet_window() {
        let (debouncer, writes) = recording(Duration::from_secs(3));

        debouncer.call(1).await;
        tokio::time::advance(Duration::from_secs(2)).await;
        debouncer.call(2).await;
        // Four seconds since the first call, but only two since the last.
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(writes.lock().await.is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(*writes.lock().await, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_delivers_immediately_and_disarms_the_timer() {
        let (debouncer, writes) = recording(Duration::from_secs(3));

        debouncer.call(7).await;
        debouncer.flush().await;
        assert_eq!(*writes.lock().await, vec![7]);

        // The aborted timer must not deliver a second time.
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(*writes.lock().await, vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_with_nothing_pending_does_nothing() {
        let (debouncer, writes) = recording(Duration::from_secs(3));
        debouncer.flush().await;
        assert!(writes.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn calls_after_a_flush_start_a_fresh_window() {
        let (debouncer, writes) = recording(Duration::from_secs(3));

        debouncer.call(1).await;
        debouncer.flush().await;
        debouncer.call(2).await;
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;

        assert_eq!(*writes.lock().await, vec![1, 2]);
    }
}
