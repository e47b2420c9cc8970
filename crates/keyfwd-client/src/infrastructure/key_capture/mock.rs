//! Mock key source for unit and integration testing.
//!
//! Allows tests to inject synthetic raw key events without a keyboard hook.
//! Events go through the same [`FilteredKeySource`] the platform adapters use,
//! so forwarded-key filtering and cancellation behave exactly as in production.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;

use keyfwd_core::{ForwardedKeySet, KeyCode};

use super::{CaptureError, FilteredKeySource, KeySource, RawKeyEvent};

/// A [`KeySource`] driven by test code.
pub struct MockKeySource {
    filter: FilteredKeySource,
    feed: Mutex<Option<Sender<RawKeyEvent>>>,
    fail_start: AtomicBool,
    start_count: AtomicU32,
}

impl MockKeySource {
    /// Creates a mock that relays only the codes in `forwarded`.
    pub fn new(forwarded: ForwardedKeySet) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            filter: FilteredKeySource::new(forwarded, rx),
            feed: Mutex::new(Some(tx)),
            fail_start: AtomicBool::new(false),
            start_count: AtomicU32::new(0),
        }
    }

    /// Injects a raw event, as if reported by the platform hook.
    ///
    /// Panics if the feed has been closed with [`close_feed`](Self::close_feed).
    pub fn inject(&self, event: RawKeyEvent) {
        let guard = self.feed.lock().expect("lock poisoned");
        guard
            .as_ref()
            .expect("MockKeySource::inject called after close_feed()")
            .send(event)
            .expect("filter receiver dropped");
    }

    /// Injects a key-down for `code`.
    pub fn press(&self, code: KeyCode) {
        self.inject(RawKeyEvent::KeyDown(code));
    }

    /// Drops the raw feed, simulating the platform mechanism dying.
    pub fn close_feed(&self) {
        *self.feed.lock().expect("lock poisoned") = None;
    }

    /// Makes the next `start()` fail as a hook installation failure would.
    pub fn fail_next_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn start_count(&self) -> u32 {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.filter.is_cancelled()
    }
}

impl KeySource for MockKeySource {
    fn start(&self) -> Result<(), CaptureError> {
        self.start_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::HookInstallFailed("mock failure".into()));
        }
        Ok(())
    }

    fn receive(&self) -> Result<Option<KeyCode>, CaptureError> {
        self.filter.next_key()
    }

    fn cancel(&self) {
        self.filter.cancel();
    }
}
