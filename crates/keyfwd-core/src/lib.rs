//! # keyfwd-core
//!
//! Shared library for keyfwd containing the key domain types, the encrypted
//! channel, the wire codec, and the lifecycle contract implemented by both
//! relays.
//!
//! This crate is used by both the client and server relays.
//! It has zero dependencies on OS APIs or network sockets.
//!
//! # Architecture overview
//!
//! keyfwd forwards a handful of media keys (volume, play/pause, ...) pressed on
//! one machine (the *client*) to another machine (the *server*), where they are
//! replayed as synthetic key presses.  Each key press travels as exactly one
//! UDP datagram:
//!
//! ```text
//! KeySource -> encode -> encrypt -> [IV:16][ciphertext:N] -> UDP
//!                                                        -> decrypt -> decode -> KeySink
//! ```
//!
//! - **`domain`** – `KeyCode`, the `ForwardedKeySet` filter, and the
//!   `SharedSecret` both ends are configured with.
//! - **`crypto`** – `CryptoChannel`: SHA-256 key derivation and AES-256-CFB
//!   with a fresh random IV per message.
//! - **`protocol`** – the `{"VkCode": n}` message body and the helpers that
//!   turn a key code into a complete wire frame and back.
//! - **`lifecycle`** – the `Relay` start/stop contract and its state machine.
//! - **`config`** – the per-role configuration schema.

pub mod config;
pub mod crypto;
pub mod domain;
pub mod lifecycle;
pub mod protocol;

pub use config::{ClientConfig, ServerConfig};
pub use crypto::{CryptoChannel, CryptoError, IV_LEN};
pub use domain::keys::{ForwardedKeySet, KeyCode};
pub use domain::secret::SharedSecret;
pub use lifecycle::{Relay, RelayState, StateCell};
pub use protocol::codec::{decode_message, encode_message, DecodeError, EncodeError, Message};
pub use protocol::frame::{open_frame, seal_key, FrameError, MAX_DATAGRAM_LEN};
