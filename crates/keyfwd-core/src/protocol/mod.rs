//! Protocol module containing the message codec and wire-frame helpers.

pub mod codec;
pub mod frame;

pub use codec::{decode_message, encode_message, DecodeError, EncodeError, Message};
pub use frame::{open_frame, seal_key, FrameError, MAX_DATAGRAM_LEN};
