//! Symmetric AEAD primitives behind the access token.
//!
//! Sealed output is laid out as `nonce (24) || ciphertext || tag (16)`, so a
//! box carries everything `open` needs except the key.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::RngCore;

use crate::constants::{NONCE_SIZE, SYMMETRIC_KEY_SIZE};
use crate::error::CryptoError;

pub type SymmetricKey = [u8; SYMMETRIC_KEY_SIZE];

/// Fresh random key from the OS generator.
pub fn generate_symmetric_key() -> SymmetricKey {
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// Encrypt and authenticate `plaintext` under a random nonce.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut sealed = vec![0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut sealed);

    let ciphertext = XChaCha20Poly1305::new(key.into())
        .encrypt(XNonce::from_slice(&sealed), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Reverse of [`seal`]. Any truncation, tampering or wrong key fails the
/// same way.
pub fn open(key: &SymmetricKey, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    XChaCha20Poly1305::new(key.into())
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Derive a key from operator-supplied secret material with BLAKE3 in KDF
/// mode. `context` keeps keys for different purposes apart.
pub fn derive_key(secret: &[u8], context: &str) -> SymmetricKey {
    blake3::derive_key(context, secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::KDF_CONTEXT_TOKEN_KEY;

    #[test]
    fn test_seal_open() {
        let key = generate_symmetric_key();
        let sealed = seal(&key, b"{\"username\":\"alice\"}").unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + 20 + 16);
        assert_eq!(open(&key, &sealed).unwrap(), b"{\"username\":\"alice\"}");
    }

    #[test]
    fn test_open_with_other_key() {
        let sealed = seal(&generate_symmetric_key(), b"payload").unwrap();
        assert!(open(&generate_symmetric_key(), &sealed).is_err());
    }

    #[test]
    fn test_open_detects_any_flipped_byte() {
        let key = generate_symmetric_key();
        let sealed = seal(&key, b"payload").unwrap();
        for i in 0..sealed.len() {
            let mut corrupted = sealed.clone();
            corrupted[i] ^= 0x01;
            assert!(open(&key, &corrupted).is_err(), "byte {i}");
        }
    }

    #[test]
    fn test_open_truncated() {
        let key = generate_symmetric_key();
        assert!(open(&key, &[]).is_err());
        assert!(open(&key, &[0u8; NONCE_SIZE - 1]).is_err());
        assert!(open(&key, &[0u8; NONCE_SIZE]).is_err());
    }

    #[test]
    fn test_nonce_is_random() {
        let key = generate_symmetric_key();
        let a = seal(&key, b"same").unwrap();
        let b = seal(&key, b"same").unwrap();
        assert_ne!(&a[..NONCE_SIZE], &b[..NONCE_SIZE]);
    }

    #[test]
    fn test_derive_key_separates_contexts() {
        let secret = b"0123456789abcdef0123456789abcdef";
        assert_eq!(
            derive_key(secret, KDF_CONTEXT_TOKEN_KEY),
            derive_key(secret, KDF_CONTEXT_TOKEN_KEY)
        );
        assert_ne!(
            derive_key(secret, KDF_CONTEXT_TOKEN_KEY),
            derive_key(secret, "phantom-other-v1")
        );
    }
}
