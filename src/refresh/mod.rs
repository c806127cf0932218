//! Refresh engine: jittered scheduling, deadlines and fault routing.

pub mod counters;
pub mod fault;
pub mod lookup;
pub mod observer;
pub mod refresher;
pub mod scheduler;
pub mod tunables;

#[cfg(test)]
mod lookup_test;
#[cfg(test)]
mod scheduler_test;

// Re-export main types
pub use counters::{Counters, OutcomeCounts};
pub use fault::RefreshFault;
pub use lookup::Lookup;
pub use observer::{ErrorHandler, ErrorObserver, HandlerSlot};
pub use refresher::{BlockingRefresher, Refresher};
pub use scheduler::{Outcome, OutcomeObserver, Scheduler};
pub use tunables::{SchedulePlan, Tunables, DEFAULT_REFRESH_INTERVAL};

use std::any::Any;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
