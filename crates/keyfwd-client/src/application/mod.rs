//! Application layer for the client.
//!
//! - **`forward_keys`** – the `ClientRelay`: couples a `KeySource` to a
//!   `FrameTransport` through a lossy, non-blocking handoff.

pub mod forward_keys;
