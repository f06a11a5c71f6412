//! # Shared Crypto - Cryptographic Primitives
//!
//! Everything signed or hashed on the ledger goes through this crate.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Entity signing hashes, Merkle nodes |
//! | `derivation` | HMAC-SHA512 (BIP32-style) | Account key derivation |
//! | `keypair` | secp256k1 ECDSA | Entity signing and verification |
//! | `address` | Keccak-256 + checksum casing | Account addresses |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization
//! - **Derivation**: hardened path for the account branch, secret material
//!   zeroized on drop
//! - **Verification**: always a boolean outcome for callers; adversarial
//!   input never panics

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod derivation;
pub mod errors;
pub mod hashing;
pub mod keypair;

// Re-exports
pub use address::{derive_address, parse_checksum_hex, to_checksum_hex};
pub use derivation::{ChildIndex, ExtendedKey, ACCOUNT_DERIVATION_PATH};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_parts, Keccak256Hasher};
pub use keypair::{verify_hash, MeritKeyPair};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
