use thiserror::Error;

/// Failures of the AEAD primitives.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,
}

/// Failures of access token issuance and verification.
///
/// Callers at the HTTP boundary must not tell `Malformed` and `Expired`
/// apart in their responses.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token secret must be at least {min} bytes, got {got}")]
    WeakKey { min: usize, got: usize },

    #[error("token lifetime must be positive")]
    InvalidTtl,

    #[error("failed to seal token payload")]
    Seal,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("expected 24 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex in identifier")]
    InvalidHex,
}
