//! Symmetric encryption for wire frames.
//!
//! See [`channel::CryptoChannel`].  There is deliberately no MAC: a tampered
//! frame decrypts to garbage, which the message codec then rejects.

pub mod channel;

pub use channel::{CryptoChannel, CryptoError, IV_LEN, KEY_LEN};
