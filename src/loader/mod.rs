pub mod catalog;
pub mod instrument;
pub mod sample_loader;
pub mod status;

use std::sync::{Mutex, MutexGuard};

pub use catalog::SampleCatalog;
pub use instrument::{InstrumentLoader, PendingLoad, SampledInstrument};
pub use sample_loader::FsFetcher;
pub use status::{LoadProgress, LoadStatus, StatusBoard, StatusEvent};

// A panicking status listener or fetch must not wedge every later caller.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
