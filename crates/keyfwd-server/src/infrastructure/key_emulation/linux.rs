//! Linux X11 key emulation via the XTest extension.
//!
//! A forwarded virtual-key code goes through two lookups before it can be
//! injected:
//!
//! ```text
//! VK code → X11 KeySym (keymap.rs) → XKeysymToKeycode(display, keysym) → X11 keycode
//! ```
//!
//! `XTestFakeKeyEvent` then synthesises a press and a release of that keycode
//! and `XFlush` pushes both to the server immediately.
//!
//! # Permissions
//!
//! The process needs access to the X display named by `DISPLAY`.  If the
//! display cannot be opened or lacks XTest, construction fails.

#![cfg(target_os = "linux")]

use std::os::raw::{c_int, c_ulong};
use std::ptr;
use std::sync::Mutex;

use keyfwd_core::KeyCode;
use tracing::{debug, info, warn};
use x11::{xlib, xtest};

use super::keymap::vk_to_x11_keysym;
use super::{KeySink, SinkError};

/// `CurrentTime`: no delay before the synthetic event is processed.
const CURRENT_TIME: c_ulong = 0;

/// Owned Xlib connection.
struct Display(*mut xlib::Display);

// SAFETY: the raw pointer is only dereferenced by Xlib calls made while the
// enclosing Mutex is held, so the connection is never used concurrently.
unsafe impl Send for Display {}

impl Drop for Display {
    fn drop(&mut self) {
        // SAFETY: self.0 came from a successful XOpenDisplay and is closed once.
        unsafe {
            xlib::XCloseDisplay(self.0);
        }
    }
}

/// Linux X11/XTest implementation of [`KeySink`].
pub struct XTestKeySink {
    display: Mutex<Display>,
}

impl XTestKeySink {
    /// Connects to the display named by the `DISPLAY` environment variable.
    ///
    /// # Errors
    ///
    /// [`SinkError::DisplayUnavailable`] if the display cannot be opened and
    /// [`SinkError::XTestUnavailable`] if it has no XTest extension.
    pub fn new() -> Result<Self, SinkError> {
        // SAFETY: a null name makes Xlib read DISPLAY; the result is checked.
        let raw = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if raw.is_null() {
            return Err(SinkError::DisplayUnavailable(std::env::var("DISPLAY").ok()));
        }
        let display = Display(raw);

        let (mut event_base, mut error_base, mut major, mut minor): (c_int, c_int, c_int, c_int) =
            (0, 0, 0, 0);
        // SAFETY: display.0 is a live connection and every out-pointer is a
        // valid stack location.
        let has_xtest = unsafe {
            xtest::XTestQueryExtension(
                display.0,
                &mut event_base,
                &mut error_base,
                &mut major,
                &mut minor,
            )
        };
        if has_xtest == xlib::False {
            return Err(SinkError::XTestUnavailable);
        }

        info!("XTest {major}.{minor} available; emitting keys on the X display");
        Ok(Self {
            display: Mutex::new(display),
        })
    }
}

impl KeySink for XTestKeySink {
    fn emit(&self, code: KeyCode) {
        let Some(keysym) = vk_to_x11_keysym(code) else {
            warn!("no X11 keysym for key {code}; ignored");
            return;
        };

        let display = self
            .display
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // SAFETY: display.0 is live for as long as the guard is held.
        unsafe {
            let keycode = xlib::XKeysymToKeycode(display.0, xlib::KeySym::from(keysym));
            if keycode == 0 {
                warn!("keysym 0x{keysym:X} for key {code} has no keycode on this display");
                return;
            }
            xtest::XTestFakeKeyEvent(display.0, u32::from(keycode), xlib::True, CURRENT_TIME);
            xtest::XTestFakeKeyEvent(display.0, u32::from(keycode), xlib::False, CURRENT_TIME);
            xlib::XFlush(display.0);
        }
        debug!("emitted key {code} as X11 keysym 0x{keysym:X}");
    }
}
