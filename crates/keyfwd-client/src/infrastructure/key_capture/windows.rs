//! Windows low-level keyboard hook implementation.
//!
//! Installs a `WH_KEYBOARD_LL` hook on a dedicated Win32 message-loop thread.
//! The hook procedure only forwards key-down virtual-key codes into the raw
//! event channel and always passes the event on to the next hook, so local
//! key handling is unaffected.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread;

use keyfwd_core::{ForwardedKeySet, KeyCode};
use tracing::{debug, info, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT,
    WM_SYSKEYDOWN,
};

use super::{CaptureError, FilteredKeySource, KeySource, RawKeyEvent};

/// Sender used by the hook procedure, which cannot capture state.
/// `Some` exactly while a hook thread is running.
static HOOK_FEED: Mutex<Option<Sender<RawKeyEvent>>> = Mutex::new(None);

/// Windows key source backed by a low-level keyboard hook.
pub struct WindowsKeySource {
    filter: FilteredKeySource,
    /// Held until `start()` hands it to the hook procedure.
    feed: Mutex<Option<Sender<RawKeyEvent>>>,
    /// Thread id of the hook message loop, used to post `WM_QUIT`.
    hook_thread: Mutex<Option<u32>>,
}

impl WindowsKeySource {
    /// Creates an unstarted source relaying only `forwarded`.
    pub fn new(forwarded: ForwardedKeySet) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            filter: FilteredKeySource::new(forwarded, rx),
            feed: Mutex::new(Some(tx)),
            hook_thread: Mutex::new(None),
        }
    }

    fn post_quit(&self) {
        let thread_id = self
            .hook_thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(thread_id) = thread_id {
            // SAFETY: PostThreadMessageW only enqueues a message; an exited
            // thread id makes the call fail, which is harmless here.
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
                debug!("hook thread already gone: {e}");
            }
        }
    }
}

impl KeySource for WindowsKeySource {
    fn start(&self) -> Result<(), CaptureError> {
        let feed = self
            .feed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or(CaptureError::AlreadyActive)?;

        {
            let mut global = HOOK_FEED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if global.is_some() {
                return Err(CaptureError::AlreadyActive);
            }
            *global = Some(feed);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, String>>();
        let spawned = thread::Builder::new()
            .name("keyfwd-hook-loop".to_string())
            .spawn(move || run_hook_message_loop(ready_tx));
        if let Err(e) = spawned {
            clear_hook_feed();
            return Err(CaptureError::HookInstallFailed(e.to_string()));
        }

        let thread_id = match ready_rx.recv() {
            Ok(Ok(thread_id)) => thread_id,
            Ok(Err(reason)) => return Err(CaptureError::HookInstallFailed(reason)),
            Err(_) => {
                return Err(CaptureError::HookInstallFailed(
                    "hook thread exited before reporting".to_string(),
                ))
            }
        };
        *self
            .hook_thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(thread_id);

        info!(
            "keyboard hook installed; forwarding {} key codes",
            self.filter.forwarded().len()
        );

        // A cancel that raced with start() found no thread to quit.
        if self.filter.is_cancelled() {
            self.post_quit();
        }
        Ok(())
    }

    fn receive(&self) -> Result<Option<KeyCode>, CaptureError> {
        self.filter.next_key()
    }

    fn cancel(&self) {
        self.filter.cancel();
        self.post_quit();
    }
}

fn clear_hook_feed() {
    *HOOK_FEED.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
}

/// Entry point for the dedicated Win32 message loop thread.
fn run_hook_message_loop(ready: Sender<Result<u32, String>>) {
    // SAFETY: SetWindowsHookExW requires the calling thread to pump messages,
    // which it does below until WM_QUIT.
    let hook = match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) }
    {
        Ok(hook) => hook,
        Err(e) => {
            clear_hook_feed();
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };
    let _ = ready.send(Ok(thread_id));

    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        if let Err(e) = UnhookWindowsHookEx(hook) {
            warn!("failed to remove keyboard hook: {e}");
        }
    }

    // Dropping the sender lets a non-cancelled receive observe the feed closing.
    clear_hook_feed();
    debug!("keyboard hook removed");
}

/// Low-level keyboard hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread.  It must return
/// quickly, so the only work done is an unbounded channel send.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        let message = w_param.0 as u32;
        if message == WM_KEYDOWN || message == WM_SYSKEYDOWN {
            // SAFETY: l_param points to a KBDLLHOOKSTRUCT when n_code == HC_ACTION.
            let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
            if let Ok(guard) = HOOK_FEED.lock() {
                if let Some(sender) = guard.as_ref() {
                    // Ignore send errors (receiver gone during shutdown).
                    let _ = sender.send(RawKeyEvent::KeyDown(KeyCode(kbs.vkCode)));
                }
            }
        }
    }

    // SAFETY: Every event is passed on; local key handling is unaffected.
    CallNextHookEx(None, n_code, w_param, l_param)
}
