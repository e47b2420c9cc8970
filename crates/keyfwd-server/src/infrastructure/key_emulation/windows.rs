//! Windows key emulation via the SendInput API.
//!
//! Key codes on the wire are already Windows virtual-key codes, so no
//! translation is needed: each code becomes a key-down `INPUT` followed by a
//! key-up `INPUT`.

#![cfg(target_os = "windows")]

use keyfwd_core::KeyCode;
use tracing::{debug, warn};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    VIRTUAL_KEY,
};

use super::KeySink;

/// Windows implementation of [`KeySink`] using SendInput.
#[derive(Debug, Default)]
pub struct WindowsKeySink;

impl WindowsKeySink {
    pub fn new() -> Self {
        Self
    }
}

impl KeySink for WindowsKeySink {
    fn emit(&self, code: KeyCode) {
        let Ok(vk) = u16::try_from(code.value()) else {
            warn!("key code {code} is outside the virtual-key range; ignored");
            return;
        };
        send_key(vk, KEYBD_EVENT_FLAGS(0));
        send_key(vk, KEYEVENTF_KEYUP);
        debug!("emitted key {code}");
    }
}

fn send_key(vk: u16, flags: KEYBD_EVENT_FLAGS) {
    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    // SAFETY: input is a valid INPUT structure on the stack.
    let inserted = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if inserted != 1 {
        warn!("SendInput inserted {inserted} of 1 events for VK 0x{vk:02X}");
    }
}
