//! AES-256-CFB channel keyed by a SHA-256 hash of the shared secret.
//!
//! Frame layout produced by [`CryptoChannel::encrypt`]:
//! ```text
//! [iv:16][ciphertext:N]
//! ```
//! `N` equals the plaintext length (CFB is a stream mode, no padding).  The IV
//! is drawn from the OS CSPRNG on every call and is never reused.

use std::fmt;

use aes::cipher::generic_array::GenericArray;
use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, InnerIvInit, KeyInit};
use cfb_mode::{Decryptor, Encryptor};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::secret::SharedSecret;

/// Length of the IV prefix; equal to the AES block size.
pub const IV_LEN: usize = 16;
/// Length of the derived AES-256 key.
pub const KEY_LEN: usize = 32;

/// Errors produced by [`CryptoChannel::decrypt`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The frame cannot even hold an IV.
    #[error("frame too short: need at least {needed} bytes, got {available}")]
    FrameTooShort { needed: usize, available: usize },
}

/// Encrypts and decrypts wire frames with a key derived once at construction.
///
/// Construction is the only place the key is set, so a channel can never be
/// used uninitialised or re-keyed.  `encrypt`/`decrypt` take `&self` and may
/// be called from any thread that owns or borrows the channel.
#[derive(Clone)]
pub struct CryptoChannel {
    cipher: Aes256,
}

impl CryptoChannel {
    /// Derives `SHA-256(secret)` and prepares an AES-256 block cipher with it.
    pub fn new(secret: &SharedSecret) -> Self {
        let key = derive_key(secret.as_bytes());
        Self {
            cipher: Aes256::new(GenericArray::from_slice(&key)),
        }
    }

    /// Encrypts `plaintext` under a fresh random IV and returns `iv || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut frame = Vec::with_capacity(IV_LEN + plaintext.len());
        frame.extend_from_slice(&iv);
        frame.extend_from_slice(plaintext);

        Encryptor::<Aes256>::inner_iv_init(self.cipher.clone(), GenericArray::from_slice(&iv))
            .encrypt(&mut frame[IV_LEN..]);
        frame
    }

    /// Splits `frame` into IV and ciphertext and returns the recovered plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::FrameTooShort`] if `frame` is shorter than
    /// [`IV_LEN`].  A frame of exactly `IV_LEN` bytes yields an empty plaintext.
    pub fn decrypt(&self, frame: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if frame.len() < IV_LEN {
            return Err(CryptoError::FrameTooShort {
                needed: IV_LEN,
                available: frame.len(),
            });
        }

        let (iv, ciphertext) = frame.split_at(IV_LEN);
        let mut plaintext = ciphertext.to_vec();
        Decryptor::<Aes256>::inner_iv_init(self.cipher.clone(), GenericArray::from_slice(iv))
            .decrypt(&mut plaintext);
        Ok(plaintext)
    }
}

impl fmt::Debug for CryptoChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoChannel").finish_non_exhaustive()
    }
}

fn derive_key(secret: &[u8]) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(secret);
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest);
    key
}
