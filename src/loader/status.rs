// Instrument load status: the per-name record and the fan-out to observers.
//
// The board is owned by the application root and handed to the loader and
// to whatever displays status. Observers either register a callback or take
// a channel receiver; both are removed when their `Subscription` drops.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use crossbeam_channel::{Receiver, Sender};
use tracing::warn;

use super::lock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.loaded as f64 / self.total as f64
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEvent {
    pub instrument: String,
    pub status: LoadStatus,
    pub progress: Option<LoadProgress>,
}

type Callback = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

#[derive(Clone)]
enum Listener {
    Callback(Callback),
    Channel(Sender<StatusEvent>),
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

impl Registry {
    fn add(&mut self, listener: Listener) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }
}

// Removal token for a listener. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

#[derive(Clone, Default)]
pub struct StatusBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl StatusBroadcaster {
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        let id = lock(&self.registry).add(Listener::Callback(Arc::new(callback)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscribe_channel(&self) -> (Subscription, Receiver<StatusEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = lock(&self.registry).add(Listener::Channel(tx));
        let sub = Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        };
        (sub, rx)
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }

    // Deliver to every current listener. Listeners run outside the registry
    // lock, so they may subscribe or unsubscribe from inside the callback.
    pub fn publish(&self, event: &StatusEvent) {
        let snapshot: Vec<(u64, Listener)> = lock(&self.registry).listeners.clone();
        let mut closed = Vec::new();

        for (id, listener) in snapshot {
            match listener {
                Listener::Callback(callback) => {
                    if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                        warn!(instrument = %event.instrument, "status listener panicked; ignoring");
                    }
                }
                Listener::Channel(tx) => {
                    if tx.send(event.clone()).is_err() {
                        closed.push(id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            lock(&self.registry)
                .listeners
                .retain(|(id, _)| !closed.contains(id));
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Record {
    status: LoadStatus,
    progress: Option<LoadProgress>,
}

// Current status per instrument name, plus the broadcaster that announces
// every change. Names never seen report `Idle`.
#[derive(Clone, Default)]
pub struct StatusBoard {
    records: Arc<Mutex<HashMap<String, Record>>>,
    broadcaster: StatusBroadcaster,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, instrument: &str) -> LoadStatus {
        lock(&self.records)
            .get(instrument)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    pub fn progress(&self, instrument: &str) -> Option<LoadProgress> {
        lock(&self.records).get(instrument).and_then(|r| r.progress)
    }

    // Every name that has been referenced so far, sorted.
    pub fn snapshot(&self) -> Vec<(String, LoadStatus, Option<LoadProgress>)> {
        let mut rows: Vec<_> = lock(&self.records)
            .iter()
            .map(|(name, r)| (name.clone(), r.status, r.progress))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    // Record the new status, then notify. A missing progress keeps the last
    // known one in the record (the event itself carries `None`).
    pub fn publish(&self, instrument: &str, status: LoadStatus, progress: Option<LoadProgress>) {
        {
            let mut records = lock(&self.records);
            let record = records.entry(instrument.to_string()).or_default();
            record.status = status;
            if progress.is_some() {
                record.progress = progress;
            }
        }
        self.broadcaster.publish(&StatusEvent {
            instrument: instrument.to_string(),
            status,
            progress,
        });
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(callback)
    }

    pub fn subscribe_channel(&self) -> (Subscription, Receiver<StatusEvent>) {
        self.broadcaster.subscribe_channel()
    }

    #[cfg(test)]
    pub fn broadcaster(&self) -> &StatusBroadcaster {
        &self.broadcaster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&StatusEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &StatusEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn unknown_names_are_idle() {
        let board = StatusBoard::new();
        assert_eq!(board.status("piano"), LoadStatus::Idle);
        assert_eq!(board.progress("piano"), None);
    }

    #[test]
    fn publish_updates_record_and_keeps_last_progress() {
        let board = StatusBoard::new();
        let p = LoadProgress { loaded: 3, total: 5 };
        board.publish("piano", LoadStatus::Loading, Some(p));
        board.publish("piano", LoadStatus::Error, None);
        assert_eq!(board.status("piano"), LoadStatus::Error);
        assert_eq!(board.progress("piano"), Some(p));
        assert_eq!(board.snapshot().len(), 1);
    }

    #[test]
    fn late_subscribers_get_no_replay() {
        let board = StatusBoard::new();
        board.publish("piano", LoadStatus::Loaded, None);
        let (count, cb) = counter();
        let _sub = board.subscribe(cb);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // but the synchronous accessor has it
        assert_eq!(board.status("piano"), LoadStatus::Loaded);
    }

    #[test]
    fn unsubscribing_one_leaves_the_others() {
        let broadcaster = StatusBroadcaster::default();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let sub_a = broadcaster.subscribe(cb_a);
        let _sub_b = broadcaster.subscribe(cb_b);
        let event = StatusEvent {
            instrument: "piano".into(),
            status: LoadStatus::Loading,
            progress: None,
        };

        broadcaster.publish(&event);
        sub_a.unsubscribe();
        broadcaster.publish(&event);

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 2);
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let board = StatusBoard::new();
        let _bad = board.subscribe(|_| panic!("listener bug"));
        let (count, cb) = counter();
        let _good = board.subscribe(cb);

        board.publish("piano", LoadStatus::Loading, None);
        board.publish("piano", LoadStatus::Loaded, None);

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(board.status("piano"), LoadStatus::Loaded);
    }

    #[test]
    fn channel_subscribers_receive_and_are_pruned_when_closed() {
        let board = StatusBoard::new();
        let (sub, rx) = board.subscribe_channel();
        board.publish("cello", LoadStatus::Loading, Some(LoadProgress { loaded: 0, total: 2 }));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.instrument, "cello");
        assert_eq!(event.status, LoadStatus::Loading);

        // receiver gone but token kept: pruned on next publish
        drop(rx);
        board.publish("cello", LoadStatus::Loaded, None);
        assert_eq!(board.broadcaster().subscriber_count(), 0);
        drop(sub);
    }

    #[test]
    fn listener_may_unsubscribe_others_while_publishing() {
        let board = StatusBoard::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (count, cb) = counter();
        *slot.lock().unwrap() = Some(board.subscribe(cb));

        let s = Arc::clone(&slot);
        let _remover = board.subscribe(move |_| {
            s.lock().unwrap().take();
        });

        board.publish("piano", LoadStatus::Loading, None);
        board.publish("piano", LoadStatus::Loaded, None);
        // the counter ran once, before the remover dropped its token
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
