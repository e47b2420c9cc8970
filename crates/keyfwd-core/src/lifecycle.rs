//! The start/stop contract shared by the client and server relays.
//!
//! Both relays follow the same state machine so a host process can manage
//! either one through the [`Relay`] trait:
//!
//! ```text
//! Created ──start()──▶ Running ──stop()──▶ Stopping ──▶ Stopped
//!    │                    │                                ▲
//!    └── startup error ───┴──── source/loop terminates ────┘
//! ```
//!
//! `start()` blocks for the lifetime of the relay; `stop()` is called from
//! another thread and is a no-op unless the relay is `Running`.

use std::sync::Mutex;

/// Lifecycle state of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Created,
    Running,
    Stopping,
    /// Terminal.  A stopped relay cannot be restarted.
    Stopped,
}

/// Uniform lifecycle for anything a host process runs until shutdown.
pub trait Relay: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the relay on the calling thread until it stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay cannot be started (endpoint resolution or
    /// bind failure, capability initialisation failure, or a second call).
    fn start(&self) -> Result<(), Self::Error>;

    /// Requests shutdown of a running relay.  Idempotent.
    fn stop(&self);

    /// Current lifecycle state.
    fn state(&self) -> RelayState;
}

/// Mutex-guarded [`RelayState`] with compare-and-set transitions.
#[derive(Debug)]
pub struct StateCell {
    inner: Mutex<RelayState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RelayState::Created),
        }
    }

    pub fn get(&self) -> RelayState {
        *self.lock()
    }

    /// Moves to `next` only if the current state is `expected`.
    /// Returns whether the transition happened.
    pub fn transition(&self, expected: RelayState, next: RelayState) -> bool {
        let mut state = self.lock();
        if *state == expected {
            *state = next;
            true
        } else {
            false
        }
    }

    pub fn set(&self, next: RelayState) {
        *self.lock() = next;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RelayState> {
        // The guarded value is a plain Copy enum; a poisoned lock still holds
        // a valid state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
