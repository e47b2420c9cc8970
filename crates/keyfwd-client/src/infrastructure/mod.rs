//! Infrastructure layer for the client application.
//!
//! Contains OS-facing adapters:
//!
//! - **`key_capture`** – the `KeySource` capability, the platform-independent
//!   filtering source every adapter is built on, a mock for tests, and the
//!   Windows low-level keyboard hook.
//!
//! - **`network`** – the `FrameTransport` seam and its UDP implementation.

pub mod key_capture;
pub mod network;
