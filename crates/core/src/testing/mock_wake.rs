//! Mock wake signal for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::wake::{WakeError, WakeSignal};

/// Mock implementation of the WakeSignal trait that counts calls.
#[derive(Debug, Default)]
pub struct MockWake {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockWake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wake calls so far.
    pub fn wake_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every wake call fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl WakeSignal for MockWake {
    fn name(&self) -> &str {
        "mock"
    }

    async fn wake(&self) -> Result<(), WakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(WakeError::RequestFailed("mock wake failure".to_string()));
        }
        Ok(())
    }
}
