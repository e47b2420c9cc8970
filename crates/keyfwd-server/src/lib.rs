//! keyfwd-server library entry point.
//!
//! The *server* is the machine that should react to the forwarded keys.  It
//! listens on one UDP port, decrypts and decodes every datagram it receives,
//! and replays each valid key code through a [`KeySink`] as a synthetic
//! press+release.  Anything it cannot decrypt or decode is discarded.

/// Application layer: the server relay.
pub mod application;

/// Infrastructure layer: key emulation adapters.
pub mod infrastructure;

pub use application::receive_keys::{process_datagram, ServerRelay, ServerRelayError, RECV_TIMEOUT};
pub use infrastructure::key_emulation::{KeySink, SinkError};
