// Instrument loading with one shared in-flight load per name.
//
// `load` returns a `PendingLoad` immediately. The first caller for a name
// starts a worker that fetches every sample in parallel; later callers get
// the same handle, whether the load is still running or long finished. A
// failed load is evicted from the cache so the next `load` starts over.

use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::catalog::{InstrumentDescriptor, SampleCatalog};
use super::lock;
use super::sample_loader::SampleFetcher;
use super::status::{LoadProgress, LoadStatus, StatusBoard};
use crate::audio::SampleBuffer;
use crate::error::LoadError;
use crate::theory::Pitch;

// A fully decoded instrument: one buffer per sampled pitch.
#[derive(Debug)]
pub struct SampledInstrument {
    pub name: String,
    pub samples: BTreeMap<Pitch, Arc<SampleBuffer>>,
}

impl SampledInstrument {
    // The sampled pitch closest to `pitch`, with its buffer. Ties go to the
    // lower sample.
    pub fn nearest(&self, pitch: Pitch) -> Option<(Pitch, &Arc<SampleBuffer>)> {
        let below = self.samples.range(..=pitch).next_back();
        let above = self.samples.range(pitch..).next();
        let pick = match (below, above) {
            (Some(b), Some(a)) => {
                if pitch.0 - b.0 .0 <= a.0 .0 - pitch.0 {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };
        Some((*pick.0, pick.1))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

pub type LoadResult = Result<Arc<SampledInstrument>, LoadError>;

#[derive(Default)]
struct LoadCell {
    result: Mutex<Option<LoadResult>>,
    ready: Condvar,
}

// Shared handle to one load attempt. Cloning is cheap; every clone sees the
// same outcome.
#[derive(Clone)]
pub struct PendingLoad {
    instrument: String,
    cell: Arc<LoadCell>,
}

impl PendingLoad {
    fn new(instrument: &str) -> Self {
        Self {
            instrument: instrument.to_string(),
            cell: Arc::new(LoadCell::default()),
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    // Non-blocking poll.
    pub fn try_result(&self) -> Option<LoadResult> {
        lock(&self.cell.result).clone()
    }

    pub fn wait(&self) -> LoadResult {
        let mut slot = lock(&self.cell.result);
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = self
                .cell
                .ready
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<LoadResult> {
        let slot = lock(&self.cell.result);
        let (slot, _) = self
            .cell
            .ready
            .wait_timeout_while(slot, timeout, |r| r.is_none())
            .unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }

    // True when both handles refer to the same attempt.
    pub fn same_attempt(&self, other: &PendingLoad) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn resolve(&self, result: LoadResult) {
        let mut slot = lock(&self.cell.result);
        if slot.is_none() {
            *slot = Some(result);
            self.cell.ready.notify_all();
        }
    }
}

struct LoaderInner {
    catalog: SampleCatalog,
    fetcher: Arc<dyn SampleFetcher>,
    board: StatusBoard,
    cache: Mutex<HashMap<String, PendingLoad>>,
}

#[derive(Clone)]
pub struct InstrumentLoader {
    inner: Arc<LoaderInner>,
}

impl InstrumentLoader {
    pub fn new(catalog: SampleCatalog, fetcher: Arc<dyn SampleFetcher>, board: StatusBoard) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                catalog,
                fetcher,
                board,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn status(&self, instrument: &str) -> LoadStatus {
        self.inner.board.status(instrument)
    }

    pub fn progress(&self, instrument: &str) -> Option<LoadProgress> {
        self.inner.board.progress(instrument)
    }

    // Start (or join) the load for `instrument`.
    pub fn load(&self, instrument: &str) -> Result<PendingLoad, LoadError> {
        let Some(descriptor) = self.inner.catalog.get(instrument).cloned() else {
            warn!(instrument, "unknown instrument");
            self.inner.board.publish(instrument, LoadStatus::Error, None);
            return Err(LoadError::UnknownInstrument(instrument.to_string()));
        };

        let pending = {
            let mut cache = lock(&self.inner.cache);
            if let Some(existing) = cache.get(instrument) {
                debug!(instrument, "joining existing load");
                return Ok(existing.clone());
            }
            let pending = PendingLoad::new(instrument);
            cache.insert(instrument.to_string(), pending.clone());
            pending
        };

        let total = descriptor.len();
        info!(instrument, total, "loading instrument");
        self.inner.board.publish(
            instrument,
            LoadStatus::Loading,
            Some(LoadProgress { loaded: 0, total }),
        );

        let inner = Arc::clone(&self.inner);
        let worker_pending = pending.clone();
        let spawned = thread::Builder::new()
            .name(format!("load-{instrument}"))
            .spawn(move || inner.run(descriptor, worker_pending));
        if let Err(e) = spawned {
            self.inner
                .fail(&pending, LoadError::Aborted(format!("could not start loader thread: {e}")));
        }

        Ok(pending)
    }

    // Fire-and-forget load; failures are only logged.
    pub fn preload(&self, instrument: &str) {
        if let Err(e) = self.load(instrument) {
            warn!(instrument, error = %e, "preload failed");
        }
    }
}

impl LoaderInner {
    fn run(&self, descriptor: InstrumentDescriptor, pending: PendingLoad) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.fetch_all(&descriptor)))
            .unwrap_or_else(|_| Err(LoadError::Aborted(format!("loader for {} panicked", descriptor.name))));

        match outcome {
            Ok(samples) => {
                let total = samples.len();
                let instrument = Arc::new(SampledInstrument {
                    name: descriptor.name.clone(),
                    samples,
                });
                self.board.publish(
                    &descriptor.name,
                    LoadStatus::Loaded,
                    Some(LoadProgress { loaded: total, total }),
                );
                info!(instrument = %descriptor.name, samples = total, "instrument loaded");
                pending.resolve(Ok(instrument));
            }
            Err(e) => self.fail(&pending, e),
        }
    }

    fn fetch_all(
        &self,
        descriptor: &InstrumentDescriptor,
    ) -> Result<BTreeMap<Pitch, Arc<SampleBuffer>>, LoadError> {
        let total = descriptor.len();
        let loaded = Mutex::new(0usize);

        descriptor
            .samples
            .par_iter()
            .map(|(pitch, file)| {
                let buffer = self.fetcher.fetch(&descriptor.name, file).map_err(|e| {
                    LoadError::SampleFetch {
                        instrument: descriptor.name.clone(),
                        pitch: pitch.to_string(),
                        reason: format!("{e:#}"),
                    }
                })?;
                // count and publish under one lock so observers see k rise by one
                let mut count = lock(&loaded);
                *count += 1;
                self.board.publish(
                    &descriptor.name,
                    LoadStatus::Loading,
                    Some(LoadProgress { loaded: *count, total }),
                );
                Ok((*pitch, Arc::new(buffer)))
            })
            .collect()
    }

    fn fail(&self, pending: &PendingLoad, error: LoadError) {
        let name = pending.instrument();
        warn!(instrument = name, error = %error, "instrument load failed");
        // publish while this attempt still owns the slot, so a retry's
        // Loading can never be overwritten by this Error
        self.board.publish(name, LoadStatus::Error, None);
        {
            let mut cache = lock(&self.cache);
            // a newer attempt may already own the slot
            if cache.get(name).is_some_and(|p| p.same_attempt(pending)) {
                cache.remove(name);
            }
        }
        pending.resolve(Err(error));
    }
}
