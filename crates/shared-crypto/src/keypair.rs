//! # Entity Signing Keys (secp256k1)
//!
//! ECDSA over secp256k1, signing precomputed 32-byte Keccak-256 hashes.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization
//! - Secret key material zeroized on drop
//!
//! ## Use Cases
//!
//! - Identity, transaction, achievement, and review signatures
//! - Chain-head announcements

use crate::derivation::{ExtendedKey, ACCOUNT_DERIVATION_PATH};
use crate::errors::CryptoError;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

/// A ledger signing keypair, derived along the fixed account path.
pub struct MeritKeyPair {
    signing_key: SigningKey,
}

impl MeritKeyPair {
    /// Generate a keypair from fresh random seed material.
    pub fn generate() -> Self {
        let mut seed = [0u8; 64];
        rand::Rng::fill(&mut rand::thread_rng(), &mut seed[..]);
        // A random 64-byte seed failing scalar parsing is ~2^-128; fall back
        // to direct random key generation rather than looping.
        let pair = Self::from_seed(&seed).unwrap_or_else(|_| Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        });
        seed.zeroize();
        pair
    }

    /// Derive the keypair for seed material along `m/44'/60'/0'/0/0`.
    ///
    /// # Errors
    ///
    /// Propagates seed and derivation failures from [`ExtendedKey`].
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        let account = ExtendedKey::from_seed(seed)?.derive_path(&ACCOUNT_DERIVATION_PATH)?;
        let mut secret = account.secret_bytes();
        let signing_key = SigningKey::from_bytes((&secret).into())
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        secret.zeroize();
        Ok(Self { signing_key })
    }

    /// Restore a keypair from raw secret scalar bytes (no derivation).
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get the compressed public key (33 bytes).
    pub fn public_key(&self) -> [u8; 33] {
        let sec1 = self.signing_key.verifying_key().to_sec1_bytes();
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1);
        bytes
    }

    /// The account address for this keypair's public key.
    pub fn address(&self) -> [u8; 20] {
        // The key was constructed from a valid secret, so its own public key
        // always parses.
        crate::address::derive_address(&self.public_key()).unwrap_or([0u8; 20])
    }

    /// Sign a precomputed 32-byte hash (deterministic RFC 6979).
    ///
    /// # Errors
    ///
    /// `InvalidSignature` if prehash signing fails.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<[u8; 64], CryptoError> {
        let signature: Signature = self
            .signing_key
            .sign_prehash(hash)
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(signature.to_bytes().into())
    }

    /// Get secret key bytes (for serialization).
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for MeritKeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

/// Verify a signature over a precomputed 32-byte hash.
///
/// Adversarial input maps to `false`, never an error or panic: malformed
/// keys and signatures are verification failures.
pub fn verify_hash(public_key: &[u8; 33], hash: &[u8; 32], signature: &[u8; 64]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify_prehash(hash, &sig).is_ok()
}
