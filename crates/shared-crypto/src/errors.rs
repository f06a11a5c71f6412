//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid signature format
    #[error("Invalid signature format")]
    InvalidSignature,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Seed material too short for key derivation
    #[error("Invalid seed: need at least {minimum} bytes, got {actual}")]
    InvalidSeed {
        /// Minimum seed length in bytes
        minimum: usize,
        /// Actual seed length in bytes
        actual: usize,
    },

    /// A derived child key fell outside the curve order (astronomically rare)
    #[error("Child key derivation failed at index {index}")]
    DerivationFailed {
        /// The child index that failed
        index: u32,
    },

    /// Address string could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Address checksum casing does not match
    #[error("Address checksum mismatch: {0}")]
    ChecksumMismatch(String),
}
