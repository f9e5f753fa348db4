//! Per-key debouncing of delayed actions
//!
//! Each call to [`Debouncer::schedule`] replaces any pending wait for the same
//! key. A wait that elapses first claims its slot under the map lock, so a
//! wait is either cancelled or fired, never both. Actions for one key are
//! serialized through a per-key gate; different keys run independently.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// Bookkeeping for one key
struct Slot {
    /// Generation of the most recently scheduled wait
    generation: u64,
    /// Handle of the wait that has not fired yet, if any
    pending: Option<AbortHandle>,
    /// Generation of the latest wait that claimed and has not finished
    running: Option<u64>,
    /// Serializes action execution for this key
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl Slot {
    fn new() -> Self {
        Self {
            generation: 0,
            pending: None,
            running: None,
            gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

#[derive(Default)]
struct State {
    slots: HashMap<String, Slot>,
    next_generation: u64,
    /// Set by `close`; later schedules are ignored
    closed: bool,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves the map consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the right to fire. Fails if the wait was superseded or cancelled.
    fn claim(&self, key: &str, generation: u64) -> Option<Arc<tokio::sync::Mutex<()>>> {
        let mut state = self.lock();
        let slot = state.slots.get_mut(key)?;
        if slot.generation != generation || slot.pending.is_none() {
            return None;
        }
        slot.pending = None;
        slot.running = Some(generation);
        Some(Arc::clone(&slot.gate))
    }

    /// Mark the action as finished and drop the slot if nothing else is queued
    fn release(&self, key: &str, generation: u64) {
        let mut state = self.lock();
        let Some(slot) = state.slots.get_mut(key) else {
            return;
        };
        if slot.running == Some(generation) {
            slot.running = None;
            if slot.pending.is_none() {
                state.slots.remove(key);
            }
        }
    }
}

/// Coalesces repeated triggers per key into a single delayed action
#[derive(Clone, Default)]
pub struct Debouncer {
    inner: Arc<Inner>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `delay` passes without another `schedule` for `key`.
    ///
    /// A pending wait for the same key is cancelled first; its action never
    /// runs. Does nothing once the debouncer is closed. Must be called from
    /// within a tokio runtime.
    pub fn schedule<F, Fut>(&self, key: impl Into<String>, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let mut state = self.inner.lock();
        if state.closed {
            trace!("Debouncer closed; ignoring {}", key);
            return;
        }

        state.next_generation += 1;
        let generation = state.next_generation;

        let slot = state.slots.entry(key.clone()).or_insert_with(Slot::new);
        if let Some(previous) = slot.pending.take() {
            previous.abort();
            debug!("Superseded pending wait for {}", key);
        }
        slot.generation = generation;

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(gate) = inner.claim(&task_key, generation) else {
                trace!("Wait for {} lost its claim", task_key);
                return;
            };

            let guard = gate.lock().await;
            action().await;
            drop(guard);

            inner.release(&task_key, generation);
        });

        // The lock is still held, so the task cannot claim before this is set
        slot.pending = Some(task.abort_handle());
        trace!("Scheduled {} (generation {}, delay {:?})", key, generation, delay);
    }

    /// Cancel the pending wait for `key`. Returns true if one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        let mut state = self.inner.lock();
        let Some(slot) = state.slots.get_mut(key) else {
            return false;
        };
        let cancelled = match slot.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        };
        if slot.running.is_none() {
            state.slots.remove(key);
        }
        cancelled
    }

    /// Cancel every pending wait. Actions already running are left alone.
    pub fn cancel_all(&self) -> usize {
        Self::cancel_locked(&mut self.inner.lock())
    }

    /// Cancel every pending wait and refuse all later schedules.
    ///
    /// Closing and cancelling happen under one lock, so a caller racing with
    /// `close` either lands before it (and is cancelled) or is ignored.
    pub fn close(&self) -> usize {
        let mut state = self.inner.lock();
        state.closed = true;
        Self::cancel_locked(&mut state)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    fn cancel_locked(state: &mut State) -> usize {
        let mut cancelled = 0;
        state.slots.retain(|_, slot| {
            if let Some(handle) = slot.pending.take() {
                handle.abort();
                cancelled += 1;
            }
            slot.running.is_some()
        });
        if cancelled > 0 {
            debug!("Cancelled {} pending waits", cancelled);
        }
        cancelled
    }

    /// Whether `key` has a wait that has not fired yet
    pub fn is_pending(&self, key: &str) -> bool {
        self.inner
            .lock()
            .slots
            .get(key)
            .is_some_and(|slot| slot.pending.is_some())
    }

    /// Number of keys with a wait that has not fired yet
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .slots
            .values()
            .filter(|slot| slot.pending.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_secs(4);

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(
        log: &Log,
        label: &str,
    ) -> impl FnOnce() -> std::future::Ready<()> + Send + use<> {
        let log = Arc::clone(log);
        let label = label.to_string();
        move || {
            log.lock().unwrap().push(label);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_action_once() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        for i in 0..5 {
            debouncer.schedule("/in/a.txt", DELAY, record(&log, &format!("run {i}")));
            sleep(Duration::from_secs(1)).await;
        }
        assert!(debouncer.is_pending("/in/a.txt"));

        sleep(DELAY * 2).await;
        assert_eq!(*log.lock().unwrap(), vec!["run 4".to_string()]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_cancel_each_other() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer.schedule("/in/a.txt", DELAY, record(&log, "a"));
        sleep(Duration::from_secs(1)).await;
        debouncer.schedule("/in/b.txt", DELAY, record(&log, "b"));
        assert_eq!(debouncer.pending_count(), 2);

        sleep(DELAY * 2).await;
        let mut ran = log.lock().unwrap().clone();
        ran.sort();
        assert_eq!(ran, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_full_delay() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer.schedule("k", DELAY, record(&log, "k"));
        sleep(DELAY - Duration::from_millis(100)).await;
        assert!(log.lock().unwrap().is_empty());
        assert!(debouncer.is_pending("k"));

        sleep(Duration::from_millis(200)).await;
        assert_eq!(log.lock().unwrap().len(), 1);
        assert!(!debouncer.is_pending("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_action() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer.schedule("k", DELAY, record(&log, "k"));
        assert!(debouncer.cancel("k"));
        assert!(!debouncer.cancel("k"));

        sleep(DELAY * 2).await;
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer.schedule("a", DELAY, record(&log, "a"));
        debouncer.schedule("b", DELAY, record(&log, "b"));
        assert_eq!(debouncer.cancel_all(), 2);

        sleep(DELAY * 2).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_can_fire_again_after_quiet_period() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer.schedule("k", DELAY, record(&log, "first"));
        sleep(DELAY * 2).await;
        debouncer.schedule("k", DELAY, record(&log, "second"));
        sleep(DELAY * 2).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_rejects_later_schedules() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        debouncer.schedule("a", DELAY, record(&log, "a"));
        assert_eq!(debouncer.close(), 1);
        assert!(debouncer.is_closed());

        debouncer.schedule("b", DELAY, record(&log, "b"));
        assert_eq!(debouncer.pending_count(), 0);

        sleep(DELAY * 2).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_close_races_with_concurrent_schedules() {
        let debouncer = Debouncer::new();
        let log = Log::default();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let debouncer = debouncer.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    for i in 0..5_000 {
                        debouncer.schedule(format!("{p}-{i}"), DELAY, record(&log, "late"));
                        if i % 64 == 0 {
                            tokio::task::yield_now().await;
                        }
                    }
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_micros(200)).await;
        debouncer.close();
        for producer in producers {
            producer.await.unwrap();
        }

        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_actions_never_overlap() {
        let debouncer = Debouncer::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let slow_action = || {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let runs = Arc::clone(&runs);
            move || async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_secs(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                runs.fetch_add(1, Ordering::SeqCst);
            }
        };

        debouncer.schedule("k", Duration::from_secs(1), slow_action());
        sleep(Duration::from_secs(2)).await;
        // First action is mid-run; this one must wait for it
        debouncer.schedule("k", Duration::from_secs(1), slow_action());
        assert!(debouncer.is_pending("k"));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
