//! # Hierarchical Key Derivation
//!
//! Deterministic child-key derivation over secp256k1, HMAC-SHA512 per level.
//! Every node derives its account key from seed material along the fixed
//! path `m/44'/60'/0'/0/0`, so an address is a pure function of the seed.
//!
//! ## Security Properties
//!
//! - Hardened derivation for the purpose/coin/account levels (no public
//!   parent key exposure)
//! - Secret material zeroized on drop

use crate::errors::CryptoError;
use hmac::{Hmac, Mac};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::{Field, PrimeField};
use k256::Scalar;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha512 = Hmac<Sha512>;

/// Domain-separation key for master-key derivation from seed material.
const MASTER_HMAC_KEY: &[u8] = b"Merit seed";

/// Minimum accepted seed length in bytes.
pub const MIN_SEED_LEN: usize = 16;

/// A single step in a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildIndex {
    /// Normal (non-hardened) derivation.
    Normal(u32),
    /// Hardened derivation (index offset by 2^31).
    Hardened(u32),
}

impl ChildIndex {
    /// The raw 32-bit index as serialized into the HMAC input.
    pub fn raw(self) -> u32 {
        match self {
            ChildIndex::Normal(i) => i,
            ChildIndex::Hardened(i) => i | 0x8000_0000,
        }
    }

    /// Whether this step uses hardened derivation.
    pub fn is_hardened(self) -> bool {
        matches!(self, ChildIndex::Hardened(_))
    }
}

/// The fixed account derivation path: `m/44'/60'/0'/0/0`.
///
/// Every participant derives its signing key along this exact path; the
/// resulting address is therefore a network-wide-consistent function of the
/// seed.
pub const ACCOUNT_DERIVATION_PATH: [ChildIndex; 5] = [
    ChildIndex::Hardened(44),
    ChildIndex::Hardened(60),
    ChildIndex::Hardened(0),
    ChildIndex::Normal(0),
    ChildIndex::Normal(0),
];

/// An extended private key: secret scalar plus chain code.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKey {
    secret: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Derive the master key from seed material.
    ///
    /// # Errors
    ///
    /// - `InvalidSeed` if the seed is shorter than [`MIN_SEED_LEN`]
    /// - `InvalidPrivateKey` if the HMAC output is not a valid scalar
    pub fn from_seed(seed: &[u8]) -> Result<Self, CryptoError> {
        if seed.len() < MIN_SEED_LEN {
            return Err(CryptoError::InvalidSeed {
                minimum: MIN_SEED_LEN,
                actual: seed.len(),
            });
        }

        let mut mac = HmacSha512::new_from_slice(MASTER_HMAC_KEY)
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        mac.update(seed);
        let output = mac.finalize().into_bytes();

        let mut secret = [0u8; 32];
        let mut chain_code = [0u8; 32];
        secret.copy_from_slice(&output[..32]);
        chain_code.copy_from_slice(&output[32..]);

        // The master secret must be a usable scalar.
        if scalar_from_bytes(&secret).is_none() {
            return Err(CryptoError::InvalidPrivateKey);
        }

        Ok(Self { secret, chain_code })
    }

    /// Derive one child key.
    ///
    /// Hardened children commit to the parent secret, normal children to the
    /// parent public key. The child secret is `parse(IL) + parent mod n`.
    ///
    /// # Errors
    ///
    /// `DerivationFailed` if the child scalar is zero or non-canonical
    /// (probability ~2^-128; there is no retry, callers pick another seed).
    pub fn derive_child(&self, index: ChildIndex) -> Result<Self, CryptoError> {
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|_| CryptoError::InvalidPrivateKey)?;

        if index.is_hardened() {
            mac.update(&[0u8]);
            mac.update(&self.secret);
        } else {
            let signing_key = SigningKey::from_bytes((&self.secret).into())
                .map_err(|_| CryptoError::InvalidPrivateKey)?;
            mac.update(&signing_key.verifying_key().to_sec1_bytes());
        }
        mac.update(&index.raw().to_be_bytes());

        let output = mac.finalize().into_bytes();
        let mut tweak = [0u8; 32];
        let mut chain_code = [0u8; 32];
        tweak.copy_from_slice(&output[..32]);
        chain_code.copy_from_slice(&output[32..]);

        let tweak_scalar = scalar_from_bytes(&tweak).ok_or(CryptoError::DerivationFailed {
            index: index.raw(),
        })?;
        let parent_scalar =
            scalar_from_bytes(&self.secret).ok_or(CryptoError::InvalidPrivateKey)?;

        let child_scalar = tweak_scalar + parent_scalar;
        if bool::from(child_scalar.is_zero()) {
            return Err(CryptoError::DerivationFailed {
                index: index.raw(),
            });
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&child_scalar.to_bytes());

        Ok(Self { secret, chain_code })
    }

    /// Derive along a whole path.
    pub fn derive_path(&self, path: &[ChildIndex]) -> Result<Self, CryptoError> {
        let mut key = Self {
            secret: self.secret,
            chain_code: self.chain_code,
        };
        for step in path {
            key = key.derive_child(*step)?;
        }
        Ok(key)
    }

    /// The secret scalar bytes of this key.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret
    }
}

/// Parse 32 bytes as a canonical non-zero scalar.
fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
    let scalar: Option<Scalar> = Scalar::from_repr((*bytes).into()).into();
    scalar.filter(|s| !bool::from(s.is_zero()))
}
