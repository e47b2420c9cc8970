//! Key emulation infrastructure for the server application.
//!
//! A [`KeySink`] replays one Windows virtual-key code as a synthetic
//! press+release.  The relay never observes whether that worked: emission
//! failures are logged by the adapter and otherwise ignored, so a sink can
//! never stop the receive loop.
//!
//! The correct implementation is selected at compile time via
//! `#[cfg(target_os = ...)]`.

use keyfwd_core::KeyCode;
use thiserror::Error;

pub mod keymap;
pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub mod linux;

/// Errors raised while constructing a platform sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot open X display {0:?}")]
    DisplayUnavailable(Option<String>),
    #[error("XTest extension is not available on this display")]
    XTestUnavailable,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Capability that injects key codes as synthetic key presses.
pub trait KeySink: Send + Sync {
    /// Emits a press followed by a release of `code`.  Fire-and-forget.
    fn emit(&self, code: KeyCode);
}
