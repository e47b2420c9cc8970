//! Application layer for the server.
//!
//! - **`receive_keys`** – the `ServerRelay`: a sequential receive loop that
//!   opens each datagram and hands valid key codes to a `KeySink`.

pub mod receive_keys;
