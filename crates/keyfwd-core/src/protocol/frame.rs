//! Complete wire frames: encode + encrypt on the way out, decrypt + decode on
//! the way in.
//!
//! A frame is the entire UDP payload; there is no magic, version, length
//! prefix, or sequence number:
//! ```text
//! [iv:16][AES-256-CFB({"VkCode":n})]
//! ```

use thiserror::Error;

use crate::crypto::{CryptoChannel, CryptoError};
use crate::domain::keys::KeyCode;
use crate::protocol::codec::{decode_message, encode_message, DecodeError, EncodeError};

/// Receive buffer size.  Comfortably larger than any frame this protocol
/// produces (16-byte IV plus a `{"VkCode":4294967295}` body).
pub const MAX_DATAGRAM_LEN: usize = 1024;

/// Why an inbound frame was dropped.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Encodes `code` and encrypts it into a single wire frame.
///
/// # Errors
///
/// Returns [`EncodeError`] if the message body cannot be serialised.
pub fn seal_key(channel: &CryptoChannel, code: KeyCode) -> Result<Vec<u8>, EncodeError> {
    let body = encode_message(code)?;
    Ok(channel.encrypt(&body))
}

/// Decrypts and decodes one received frame.
///
/// # Errors
///
/// Returns [`FrameError`] for undersized frames and for anything that does not
/// decrypt to a valid key message (including frames sealed with another secret).
pub fn open_frame(channel: &CryptoChannel, frame: &[u8]) -> Result<KeyCode, FrameError> {
    let body = channel.decrypt(frame)?;
    Ok(decode_message(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::IV_LEN;
    use crate::domain::secret::SharedSecret;

    #[test]
    fn test_sealed_frame_opens_to_same_code() {
        let channel = CryptoChannel::new(&SharedSecret::from("s3cr3t"));

        let frame = seal_key(&channel, KeyCode(174)).unwrap();

        assert_eq!(open_frame(&channel, &frame).unwrap(), KeyCode(174));
    }

    #[test]
    fn test_largest_frame_fits_receive_buffer() {
        let channel = CryptoChannel::new(&SharedSecret::from("s3cr3t"));

        let frame = seal_key(&channel, KeyCode(u32::MAX)).unwrap();

        assert!(frame.len() < MAX_DATAGRAM_LEN);
    }

    #[test]
    fn test_open_undersized_frame_is_crypto_error() {
        let channel = CryptoChannel::new(&SharedSecret::from("s3cr3t"));

        let err = open_frame(&channel, &[0u8; IV_LEN - 1]).unwrap_err();

        assert!(matches!(err, FrameError::Crypto(CryptoError::FrameTooShort { .. })));
    }

    #[test]
    fn test_open_iv_only_frame_is_decode_error() {
        let channel = CryptoChannel::new(&SharedSecret::from("s3cr3t"));

        let err = open_frame(&channel, &[0u8; IV_LEN]).unwrap_err();

        assert!(matches!(err, FrameError::Decode(DecodeError::Empty)));
    }
}
