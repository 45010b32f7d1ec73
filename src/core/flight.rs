//! Single-flight guard
//!
//! At most one holder of a permit at a time. The permit clears the flag when
//! dropped, so every exit path (early return, `?`, unwinding) releases it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the permit, or `None` if someone already holds it
    pub fn try_acquire(&self) -> Option<FlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct FlightPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
