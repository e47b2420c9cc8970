//! Domain types shared by both relays.
//!
//! Nothing in here touches the network or the OS input subsystem:
//!
//! - **`keys`** – `KeyCode` and the `ForwardedKeySet` that decides which
//!   captured keys are relayed.
//! - **`secret`** – `SharedSecret`, the out-of-band credential the channel key
//!   is derived from.

pub mod keys;
pub mod secret;
