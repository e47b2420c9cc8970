//! Key capture infrastructure for the client application.
//!
//! Platform capture mechanisms are callback driven: on Windows a
//! `WH_KEYBOARD_LL` hook procedure runs on a dedicated message-loop thread and
//! must return within a few hundred milliseconds or the OS removes the hook.
//! Every adapter therefore does the minimum inside the callback, pushing a
//! [`RawKeyEvent`] into an unbounded `mpsc` channel, and all filtering and
//! cancellation happens in [`FilteredKeySource`] on the relay's capture thread.
//!
//! # Testability
//!
//! The [`KeySource`] trait lets the relay run against [`mock::MockKeySource`],
//! which feeds synthetic raw events through the same filtering path the real
//! adapters use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::time::Duration;

use keyfwd_core::{ForwardedKeySet, KeyCode};
use tracing::trace;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// How long a blocked `receive` waits before re-checking for cancellation.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A raw keyboard event reported by a platform adapter, before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKeyEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
}

/// Error type for key capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to install keyboard hook: {0}")]
    HookInstallFailed(String),
    #[error("a keyboard capture session is already active")]
    AlreadyActive,
    #[error("the raw key event feed closed unexpectedly")]
    FeedClosed,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Capability producing the key codes a client relays.
///
/// Semantically a lazy, infinite sequence of accepted codes per capture
/// session.  `cancel` may be called from any thread.
pub trait KeySource: Send + Sync {
    /// Acquires the platform capture mechanism.  Called once by the relay
    /// before the first `receive`.
    fn start(&self) -> Result<(), CaptureError>;

    /// Blocks until the next accepted key code arrives.
    ///
    /// Returns `Ok(None)` once cancellation has been requested.
    fn receive(&self) -> Result<Option<KeyCode>, CaptureError>;

    /// Makes any in-progress and every future `receive` return `Ok(None)`
    /// promptly, and releases the platform capture mechanism.
    fn cancel(&self);
}

/// Turns a raw event feed into the filtered, cancellable sequence a
/// [`KeySource`] exposes.
///
/// Only key-down events whose code is in the [`ForwardedKeySet`] are
/// returned.  Cancellation is sticky.
pub struct FilteredKeySource {
    events: Mutex<mpsc::Receiver<RawKeyEvent>>,
    forwarded: ForwardedKeySet,
    cancelled: AtomicBool,
}

impl FilteredKeySource {
    pub fn new(forwarded: ForwardedKeySet, events: mpsc::Receiver<RawKeyEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            forwarded,
            cancelled: AtomicBool::new(false),
        }
    }

    /// The set of codes this source lets through.
    pub fn forwarded(&self) -> &ForwardedKeySet {
        &self.forwarded
    }

    /// Blocks until an accepted key-down arrives or cancellation is requested.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::FeedClosed`] if every sender of the raw feed
    /// has been dropped without cancellation.
    pub fn next_key(&self) -> Result<Option<KeyCode>, CaptureError> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if self.is_cancelled() {
                return Ok(None);
            }
            match events.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(RawKeyEvent::KeyDown(code)) if self.forwarded.contains(code) => {
                    return Ok(Some(code));
                }
                Ok(event) => trace!("ignoring {event:?}"),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return if self.is_cancelled() {
                        Ok(None)
                    } else {
                        Err(CaptureError::FeedClosed)
                    };
                }
            }
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
