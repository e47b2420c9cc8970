//! keyfwd-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the host binary share the same module tree.
//!
//! # What does the client do?
//!
//! The *client* is the machine whose keyboard has the media keys.  It:
//!
//! 1. Captures key-down events through a [`KeySource`] and keeps only the
//!    codes in its configured `ForwardedKeySet`.
//! 2. Hands each accepted code to a network worker thread without ever
//!    blocking the capture path (a busy worker means the key is dropped).
//! 3. Encodes, encrypts, and sends every handed-off code as one UDP datagram
//!    to the server.

/// Application layer: the client relay.
pub mod application;

/// Infrastructure layer: key capture adapters and the UDP transport.
pub mod infrastructure;

pub use application::forward_keys::{ClientRelay, ClientRelayError, RelayStats, StatsSnapshot};
pub use infrastructure::key_capture::{CaptureError, KeySource};
pub use infrastructure::network::{FrameTransport, NetworkError, UdpFrameTransport};
