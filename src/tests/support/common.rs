// Common helpers shared by refresh tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::refresh::{ErrorHandler, RefreshFault, Tunables};

pub type Map = HashMap<String, String>;

/// Tunables without jitter, so the effective interval equals the configured one.
pub fn exact_tunables() -> Tunables {
    Tunables {
        jitter_pct: 0.0,
        jitter_floor: Duration::ZERO,
        ..Tunables::default()
    }
}

/// Builds a single-entry map snapshot.
pub fn map_of(key: &str, value: &str) -> Map {
    let mut m = HashMap::new();
    m.insert(key.to_string(), value.to_string());
    m
}

/// Error handler that records every fault it receives as text.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub faults: Arc<Mutex<Vec<String>>>,
    pub timeouts: Arc<AtomicUsize>,
}

impl RecordingHandler {
    pub fn handler(&self) -> ErrorHandler {
        let faults = Arc::clone(&self.faults);
        let timeouts = Arc::clone(&self.timeouts);
        ErrorHandler::new(move |fault: &RefreshFault, _at| {
            if fault.is_timeout() {
                timeouts.fetch_add(1, Ordering::SeqCst);
            }
            faults.lock().push(match fault.error() {
                Some(e) => e.to_string(),
                None => fault.to_string(),
            });
            Ok(())
        })
    }

    pub fn count(&self) -> usize {
        self.faults.lock().len()
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<String> {
        self.faults.lock().clone()
    }
}
