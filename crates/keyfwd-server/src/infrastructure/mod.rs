//! Infrastructure layer for the server application.
//!
//! **Dependency rule**: this layer may depend on `keyfwd_core` but not on the
//! `application` layer.
//!
//! - **`key_emulation`** – the `KeySink` capability with `SendInput` (Windows)
//!   and XTest (Linux) implementations, plus a recording mock for tests.

pub mod key_emulation;
