//! Key codes and the forwarded-key filter.
//!
//! A [`KeyCode`] is an integer in the host platform's key-code space.  The
//! reference platform is Windows, so the values are Win32 Virtual-Key codes
//! (`VK_*`), e.g. `0xAE` for `VK_VOLUME_DOWN`.  No validation happens beyond
//! membership in a [`ForwardedKeySet`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer identifier of a physical key in the host platform's key-code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// `VK_PAUSE`
    pub const PAUSE: KeyCode = KeyCode(0x13);
    /// `VK_VOLUME_MUTE`
    pub const VOLUME_MUTE: KeyCode = KeyCode(0xAD);
    /// `VK_VOLUME_DOWN`
    pub const VOLUME_DOWN: KeyCode = KeyCode(0xAE);
    /// `VK_VOLUME_UP`
    pub const VOLUME_UP: KeyCode = KeyCode(0xAF);
    /// `VK_MEDIA_NEXT_TRACK`
    pub const MEDIA_NEXT_TRACK: KeyCode = KeyCode(0xB0);
    /// `VK_MEDIA_PREV_TRACK`
    pub const MEDIA_PREV_TRACK: KeyCode = KeyCode(0xB1);
    /// `VK_MEDIA_STOP`
    pub const MEDIA_STOP: KeyCode = KeyCode(0xB2);
    /// `VK_MEDIA_PLAY_PAUSE`
    pub const MEDIA_PLAY_PAUSE: KeyCode = KeyCode(0xB3);
    /// `VK_PLAY`
    pub const PLAY: KeyCode = KeyCode(0xFA);

    /// Returns the raw integer value.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for KeyCode {
    fn from(value: u32) -> Self {
        KeyCode(value)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.0, self.0)
    }
}

/// The set of key codes a client relays.  Immutable once the client starts.
///
/// Serialised as a plain list of integers so a config file can say
/// `forwarded_keys = [173, 174, 175]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<KeyCode>", into = "Vec<KeyCode>")]
pub struct ForwardedKeySet {
    codes: BTreeSet<KeyCode>,
}

impl ForwardedKeySet {
    /// Builds a set from any collection of codes.  Duplicates collapse.
    pub fn new<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = KeyCode>,
    {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// The default set: the media and volume keys this tool exists to forward.
    pub fn media_keys() -> Self {
        Self::new([
            KeyCode::VOLUME_MUTE,
            KeyCode::VOLUME_DOWN,
            KeyCode::VOLUME_UP,
            KeyCode::MEDIA_NEXT_TRACK,
            KeyCode::MEDIA_PREV_TRACK,
            KeyCode::MEDIA_STOP,
            KeyCode::MEDIA_PLAY_PAUSE,
            KeyCode::PLAY,
            KeyCode::PAUSE,
        ])
    }

    /// Returns `true` if `code` should be relayed.
    pub fn contains(&self, code: KeyCode) -> bool {
        self.codes.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterates the codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.codes.iter().copied()
    }
}

impl Default for ForwardedKeySet {
    fn default() -> Self {
        Self::media_keys()
    }
}

impl From<Vec<KeyCode>> for ForwardedKeySet {
    fn from(codes: Vec<KeyCode>) -> Self {
        Self::new(codes)
    }
}

impl From<ForwardedKeySet> for Vec<KeyCode> {
    fn from(set: ForwardedKeySet) -> Self {
        set.codes.into_iter().collect()
    }
}

impl FromIterator<KeyCode> for ForwardedKeySet {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        Self::new(iter)
    }
}
