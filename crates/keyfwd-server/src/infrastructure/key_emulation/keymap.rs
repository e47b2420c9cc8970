//! Windows virtual-key code to X11 KeySym translation for the forwarded keys.
//!
//! Media keys live in the XF86 vendor range of `XF86keysym.h`; `Pause` is
//! the core `XK_Pause` from `keysymdef.h`.  Only keys a client can be
//! configured to forward by default are covered.

use keyfwd_core::KeyCode;

/// Translates a virtual-key code to an X11 KeySym.
///
/// Returns `None` if the code has no mapping.
pub fn vk_to_x11_keysym(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::PAUSE => Some(0xFF13),              // XK_Pause
        KeyCode::VOLUME_MUTE => Some(0x1008_FF12),   // XF86XK_AudioMute
        KeyCode::VOLUME_DOWN => Some(0x1008_FF11),   // XF86XK_AudioLowerVolume
        KeyCode::VOLUME_UP => Some(0x1008_FF13),     // XF86XK_AudioRaiseVolume
        KeyCode::MEDIA_NEXT_TRACK => Some(0x1008_FF17), // XF86XK_AudioNext
        KeyCode::MEDIA_PREV_TRACK => Some(0x1008_FF16), // XF86XK_AudioPrev
        KeyCode::MEDIA_STOP => Some(0x1008_FF15),    // XF86XK_AudioStop
        // X11 has no separate play/pause toggle; AudioPlay toggles in practice.
        KeyCode::MEDIA_PLAY_PAUSE | KeyCode::PLAY => Some(0x1008_FF14), // XF86XK_AudioPlay
        _ => None,
    }
}
