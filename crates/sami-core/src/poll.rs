//! Periodic re-fetch for dashboard views.
//!
//! A poller runs one fetch per interval and reports each result on a
//! channel. Fetches for the same poller never overlap: a tick that comes
//! due while a fetch is still in flight is skipped. Stopping the poller,
//! or dropping its handle or receiver, cancels the fetch in flight.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::{ApiError, ApiResult};

/// Buffer size for undelivered poll results.
/// A view that falls this far behind only needs the latest data anyway.
const RESULT_BUFFER_SIZE: usize = 4;

/// Handle to a running poller. Dropping it stops the poller.
pub struct PollHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop polling and wait for the task to wind down.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Start polling `fetch` every `interval`, first fetch immediately.
///
/// The poller ends on its own after an `Unauthorized` result (the session
/// is gone, further fetches would fail the same way) or once the receiver
/// is dropped.
pub fn spawn<T, F, Fut>(
    name: &'static str,
    interval: Duration,
    fetch: F,
) -> (PollHandle, mpsc::Receiver<ApiResult<T>>)
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ApiResult<T>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(RESULT_BUFFER_SIZE);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(run(name, interval, fetch, tx, shutdown_rx));

    let handle = PollHandle {
        name,
        shutdown: shutdown_tx,
        task: Some(task),
    };
    (handle, rx)
}

async fn run<T, F, Fut>(
    name: &'static str,
    interval: Duration,
    fetch: F,
    tx: mpsc::Sender<ApiResult<T>>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    info!(poller = name, interval_ms = interval.as_millis() as u64, "Poller started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.changed() => break,
        }

        let result = tokio::select! {
            result = fetch() => result,
            _ = shutdown_rx.changed() => {
                debug!(poller = name, "Cancelled in-flight fetch");
                break;
            }
        };

        let unauthorized = matches!(result, Err(ApiError::Unauthorized));

        // A full buffer must not keep the poller alive past shutdown
        let delivered = tokio::select! {
            sent = tx.send(result) => sent.is_ok(),
            _ = shutdown_rx.changed() => {
                debug!(poller = name, "Stopped while waiting for the receiver");
                break;
            }
        };
        if !delivered {
            debug!(poller = name, "Receiver dropped");
            break;
        }
        if unauthorized {
            info!(poller = name, "Session rejected, polling stopped");
            break;
        }
    }

    info!(poller = name, "Poller stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_delivers_results_each_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let (handle, mut rx) = spawn("counter", TICK, move || {
            let c = c.clone();
            async move { Ok(c.fetch_add(1, Ordering::SeqCst)) }
        });

        assert_eq!(rx.recv().await.unwrap().unwrap(), 0);
        assert_eq!(rx.recv().await.unwrap().unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap().unwrap(), 2);
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_unauthorized_ends_polling() {
        let (_handle, mut rx) = spawn("rejected", TICK, || async {
            Err::<(), _>(ApiError::Unauthorized)
        });

        assert!(matches!(rx.recv().await, Some(Err(ApiError::Unauthorized))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_other_errors_keep_polling() {
        let (handle, mut rx) = spawn("flaky", TICK, || async {
            Err::<(), _>(ApiError::ServerError(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom".into()))
        });

        assert!(matches!(rx.recv().await, Some(Err(ApiError::ServerError(..)))));
        assert!(matches!(rx.recv().await, Some(Err(ApiError::ServerError(..)))));
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_fetches_never_overlap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let (f, m) = (in_flight.clone(), max_seen.clone());

        // Each fetch takes three ticks
        let (handle, mut rx) = spawn("slow", TICK, move || {
            let (f, m) = (f.clone(), m.clone());
            async move {
                let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(TICK * 3).await;
                f.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        });

        for _ in 0..3 {
            rx.recv().await.unwrap().unwrap();
        }
        handle.stop().await;
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_cancels_in_flight_fetch() {
        let (handle, mut rx) = spawn("hung", TICK, || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });

        tokio::time::sleep(TICK).await;
        tokio::time::timeout(Duration::from_secs(2), handle.stop())
            .await
            .expect("stop returns promptly");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_returns_when_receiver_is_not_drained() {
        let (handle, _rx) = spawn("ignored", Duration::from_millis(5), || async { Ok(1) });

        // Long enough to fill the result buffer and block on send
        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio::time::timeout(Duration::from_secs(3), handle.stop())
            .await
            .expect("stop returns with a full buffer");
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_poller() {
        let (handle, mut rx) = spawn("dropped", TICK, || async { Ok(1) });
        assert_eq!(rx.recv().await.unwrap().unwrap(), 1);
        drop(handle);

        // Drain anything already buffered, then the channel closes
        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok());
    }
}
