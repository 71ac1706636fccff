//! Pluggable payload encryption.
//!
//! Every payload passes through an [`Encryption`] provider between the
//! serializer and the byte store. [`NoEncryption`] is the identity transform
//! used when nothing is configured; [`XChaChaEncryption`] provides
//! authenticated encryption.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use crate::error::{StoreError, StoreResult};

/// Transforms payload bytes to and from their encrypted form.
pub trait Encryption: Send + Sync {
    /// Encrypt a serialized payload.
    fn encrypt(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>>;

    /// Decrypt a payload previously produced by [`Encryption::encrypt`].
    fn decrypt(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>>;
}

/// Identity provider: payloads are stored as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEncryption;

impl Encryption for NoEncryption {
    fn encrypt(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// BLAKE3 key-derivation context for passphrase keys.
const KDF_CONTEXT: &str = "coffer 2024-01 chest encryption key";

/// XChaCha20-Poly1305 provider.
///
/// Output format: `nonce (24 bytes) || ciphertext || tag (16 bytes)`. The
/// nonce is random per payload, so encrypting the same value twice yields
/// different bytes.
#[derive(Clone)]
pub struct XChaChaEncryption {
    key: [u8; 32],
}

impl XChaChaEncryption {
    /// Use a raw 256-bit key.
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Derive the key from a passphrase with BLAKE3 in key-derivation mode.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::new(blake3::derive_key(KDF_CONTEXT, passphrase.as_bytes()))
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.key))
    }
}

impl Encryption for XChaChaEncryption {
    fn encrypt(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, plaintext)
            .map_err(|e| StoreError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(StoreError::Encryption(format!(
                "ciphertext too short ({} bytes)",
                ciphertext.len()
            )));
        }
        let (nonce, body) = ciphertext.split_at(NONCE_SIZE);
        self.cipher()
            .decrypt(XNonce::from_slice(nonce), body)
            .map_err(|_| StoreError::Encryption("decryption failed (wrong key or tampered data)".into()))
    }
}

impl std::fmt::Debug for XChaChaEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XChaChaEncryption")
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_roundtrip() {
        let enc = NoEncryption;
        let sealed = enc.encrypt(b"plain").unwrap();
        assert_eq!(sealed, b"plain");
        assert_eq!(enc.decrypt(&sealed).unwrap(), b"plain");
    }

    #[test]
    fn xchacha_roundtrip() {
        let enc = XChaChaEncryption::from_passphrase("correct horse");
        let sealed = enc.encrypt(b"hello, world!").unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + 13 + TAG_SIZE);
        assert_ne!(&sealed[NONCE_SIZE..NONCE_SIZE + 13], b"hello, world!");
        assert_eq!(enc.decrypt(&sealed).unwrap(), b"hello, world!");
    }

    #[test]
    fn xchacha_nonce_is_random() {
        let enc = XChaChaEncryption::new([7u8; 32]);
        assert_ne!(enc.encrypt(b"same").unwrap(), enc.encrypt(b"same").unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = XChaChaEncryption::from_passphrase("one").encrypt(b"secret").unwrap();
        let err = XChaChaEncryption::from_passphrase("two")
            .decrypt(&sealed)
            .unwrap_err();
        assert!(matches!(err, StoreError::Encryption(_)));
    }

    #[test]
    fn short_ciphertext_fails() {
        let enc = XChaChaEncryption::new([1u8; 32]);
        assert!(matches!(
            enc.decrypt(&[0u8; 10]).unwrap_err(),
            StoreError::Encryption(_)
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let debug = format!("{:?}", XChaChaEncryption::new([9u8; 32]));
        assert!(debug.contains("redacted"));
        assert!(!debug.contains('9'));
    }
}
