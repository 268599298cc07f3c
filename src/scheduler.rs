//! Debounced, disposal-aware application of updates — one actor per
//! consumer.
//!
//! Each consumer (an open editor, a list view, a status widget) owns one
//! [`UpdateScheduler`]. Producers call [`UpdateScheduler::enqueue`], which
//! never blocks; the actor task coalesces updates sharing a merge key
//! (latest payload wins) and applies whatever is pending once the debounce
//! window closes. At most one application is in flight per consumer;
//! different consumers proceed independently.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Reference coalescing delay between accepting a batch and applying it.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Where fired updates land.
///
/// `is_disposed` is consulted per update at firing time: a disposed
/// consumer gets [`UpdateSink::rejected`] instead of apply, so bookkeeping
/// (e.g. marking the last-good state consistent) still runs and the
/// consumer never appears permanently in-progress.
pub trait UpdateSink<T>: Send + 'static {
    fn is_disposed(&self) -> bool;

    /// Apply one update. Errors are logged by the actor and do not stop
    /// later updates.
    fn apply(&mut self, payload: T) -> anyhow::Result<()>;

    /// Finalizer for an update that will never be applied.
    fn rejected(&mut self, payload: T);
}

struct Update<T> {
    key: String,
    payload: T,
}

/// Handle to a consumer's debounce actor.
///
/// Dropping the handle disposes the queue: updates not yet fired are
/// rejected (an application already executing is not interrupted).
pub struct UpdateScheduler<T> {
    tx: mpsc::UnboundedSender<Update<T>>,
}

impl<T: Send + 'static> UpdateScheduler<T> {
    /// Spawn the actor task. Requires a running tokio runtime.
    #[must_use]
    pub fn spawn<S: UpdateSink<T>>(delay: Duration, sink: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(delay, rx, sink));
        Self { tx }
    }

    /// Queue an update; never blocks the producer.
    ///
    /// While the debounce window is open, an update sharing `key` replaces
    /// the queued payload, so the queue never grows beyond one entry per
    /// key. Enqueueing after disposal is a no-op.
    pub fn enqueue(&self, key: impl Into<String>, payload: T) {
        let _ = self.tx.send(Update {
            key: key.into(),
            payload,
        });
    }
}

async fn run<T, S: UpdateSink<T>>(
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Update<T>>,
    mut sink: S,
) {
    // Pending updates in first-enqueue order, at most one per key.
    let mut pending: Vec<Update<T>> = Vec::new();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(update) => {
                    match pending.iter_mut().find(|queued| queued.key == update.key) {
                        Some(queued) => queued.payload = update.payload,
                        None => pending.push(update),
                    }
                    deadline = Some(Instant::now() + delay);
                }
                None => break,
            },
            () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                for update in pending.drain(..) {
                    if sink.is_disposed() {
                        sink.rejected(update.payload);
                    } else if let Err(e) = sink.apply(update.payload) {
                        tracing::warn!(key = %update.key, "update application failed: {e:#}");
                    }
                }
            }
        }
    }

    // Channel closed: the consumer is gone. Finalize whatever never fired.
    for update in pending.drain(..) {
        sink.rejected(update.payload);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::document::{Document, DocumentSnapshot};
    use crate::types::{Position, Region};

    #[derive(Default)]
    struct Trace {
        applied: Mutex<Vec<String>>,
        rejected: Mutex<Vec<String>>,
        disposed: AtomicBool,
    }

    struct TestSink {
        trace: Arc<Trace>,
        fail_on: Option<String>,
    }

    impl UpdateSink<String> for TestSink {
        fn is_disposed(&self) -> bool {
            self.trace.disposed.load(Ordering::SeqCst)
        }

        fn apply(&mut self, payload: String) -> anyhow::Result<()> {
            if self.fail_on.as_deref() == Some(payload.as_str()) {
                anyhow::bail!("induced failure for {payload}");
            }
            self.trace.applied.lock().unwrap().push(payload);
            Ok(())
        }

        fn rejected(&mut self, payload: String) {
            self.trace.rejected.lock().unwrap().push(payload);
        }
    }

    fn scheduler(trace: &Arc<Trace>) -> UpdateScheduler<String> {
        UpdateScheduler::spawn(
            DEBOUNCE_DELAY,
            TestSink {
                trace: Arc::clone(trace),
                fail_on: None,
            },
        )
    }

    async fn settle() {
        // Paused-clock tests: sleeping auto-advances time past the window
        // once the actor task has gone idle.
        tokio::time::sleep(DEBOUNCE_DELAY * 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_coalesces_to_latest_payload() {
        let trace = Arc::new(Trace::default());
        let queue = scheduler(&trace);

        queue.enqueue("src/Main.elm", "u1".to_string());
        queue.enqueue("src/Main.elm", "u2".to_string());
        settle().await;

        assert_eq!(*trace.applied.lock().unwrap(), vec!["u2"]);
        assert!(trace.rejected.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_batches_apply_only_second() {
        let trace = Arc::new(Trace::default());
        let queue = scheduler(&trace);

        queue.enqueue("editor", "first batch".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        queue.enqueue("editor", "second batch".to_string());
        settle().await;

        // The first batch is discarded unapplied.
        assert_eq!(*trace.applied.lock().unwrap(), vec!["second batch"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_fire_in_enqueue_order() {
        let trace = Arc::new(Trace::default());
        let queue = scheduler(&trace);

        queue.enqueue("a", "for a".to_string());
        queue.enqueue("b", "for b".to_string());
        settle().await;

        assert_eq!(*trace.applied.lock().unwrap(), vec!["for a", "for b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_after_window_fire_separately() {
        let trace = Arc::new(Trace::default());
        let queue = scheduler(&trace);

        queue.enqueue("k", "first".to_string());
        settle().await;
        queue.enqueue("k", "second".to_string());
        settle().await;

        assert_eq!(*trace.applied.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disposed_consumer_rejects_instead_of_applying() {
        let trace = Arc::new(Trace::default());
        let queue = scheduler(&trace);

        queue.enqueue("k", "late".to_string());
        trace.disposed.store(true, Ordering::SeqCst);
        settle().await;

        assert!(trace.applied.lock().unwrap().is_empty());
        assert_eq!(*trace.rejected.lock().unwrap(), vec!["late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_scheduler_rejects_pending() {
        let trace = Arc::new(Trace::default());
        let queue = scheduler(&trace);

        queue.enqueue("k", "never fires".to_string());
        drop(queue);
        settle().await;

        assert!(trace.applied.lock().unwrap().is_empty());
        assert_eq!(*trace.rejected.lock().unwrap(), vec!["never fires"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_error_does_not_stop_later_updates() {
        let trace = Arc::new(Trace::default());
        let queue = UpdateScheduler::spawn(
            DEBOUNCE_DELAY,
            TestSink {
                trace: Arc::clone(&trace),
                fail_on: Some("bad".to_string()),
            },
        );

        queue.enqueue("a", "bad".to_string());
        queue.enqueue("b", "good".to_string());
        settle().await;

        assert_eq!(*trace.applied.lock().unwrap(), vec!["good"]);
    }

    /// An editor-like sink: maps queued regions against the document
    /// snapshot current at firing time and keeps only what still maps.
    struct EditorSink {
        document: Arc<Mutex<Document>>,
        rendered: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl UpdateSink<Vec<Region>> for EditorSink {
        fn is_disposed(&self) -> bool {
            false
        }

        fn apply(&mut self, regions: Vec<Region>) -> anyhow::Result<()> {
            // One consistent snapshot for the whole pass.
            let snapshot: DocumentSnapshot = self.document.lock().unwrap().snapshot();
            let mut rendered = self.rendered.lock().unwrap();
            rendered.clear();
            rendered.extend(
                regions
                    .iter()
                    .filter_map(|region| snapshot.map_region(region)),
            );
            Ok(())
        }

        fn rejected(&mut self, _regions: Vec<Region>) {}
    }

    fn span(line: u32, start_col: u32, end_col: u32) -> Region {
        Region {
            start: Position { line, column: start_col },
            end: Position { line, column: end_col },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_regions_skipped_at_apply_time() {
        let document = Arc::new(Mutex::new(Document::new("abcdef\nghijkl\n")));
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let queue = UpdateScheduler::spawn(
            DEBOUNCE_DELAY,
            EditorSink {
                document: Arc::clone(&document),
                rendered: Arc::clone(&rendered),
            },
        );

        // Region on line 2 was valid when produced...
        queue.enqueue("editor", vec![span(1, 1, 4), span(2, 1, 4)]);
        // ...but the document shrinks before the window closes.
        document.lock().unwrap().replace("abcdef".to_string());
        settle().await;

        // Only the still-mappable region renders; the stale one is skipped
        // silently, this round.
        assert_eq!(*rendered.lock().unwrap(), vec![(0, 3)]);
    }
}
