//! Mock key sink for unit and integration testing.
//!
//! Records every emitted code in order instead of touching the OS, so tests
//! can assert exactly which keys the relay replayed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use keyfwd_core::KeyCode;

use super::KeySink;

/// A [`KeySink`] that records calls without performing OS API calls.
#[derive(Debug, Default)]
pub struct MockKeySink {
    /// Every code passed to `emit`, in call order.
    pub emitted: Mutex<Vec<KeyCode>>,
}

impl MockKeySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the codes emitted so far.
    pub fn emitted(&self) -> Vec<KeyCode> {
        self.emitted.lock().unwrap().clone()
    }

    /// Polls until at least `count` codes were emitted or `timeout` elapses.
    /// Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.emitted.lock().unwrap().len() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl KeySink for MockKeySink {
    fn emit(&self, code: KeyCode) {
        self.emitted.lock().unwrap().push(code);
    }
}
