//! # Account Addresses
//!
//! An address is the last 20 bytes of the Keccak-256 hash of the
//! uncompressed public-key point body. The canonical display form is
//! checksum-cased hex: the casing of each hex digit encodes one bit of the
//! Keccak-256 hash of the lowercase address string, so a single-character
//! typo is caught locally.

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

/// Derive the 20-byte account address from a compressed public key.
///
/// # Errors
///
/// `InvalidPublicKey` if the bytes are not a valid compressed SEC1 point.
pub fn derive_address(public_key: &[u8; 33]) -> Result<[u8; 20], CryptoError> {
    let verifying_key =
        VerifyingKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let point = verifying_key.to_encoded_point(false);
    // Skip the 0x04 prefix; hash the 64-byte point body.
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    Ok(address)
}

/// Render an address in checksum-cased hex with `0x` prefix.
pub fn to_checksum_hex(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let digest = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            digest[i / 2] >> 4
        } else {
            digest[i / 2] & 0x0F
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse an address from hex.
///
/// All-lowercase and all-uppercase inputs are accepted as checksum-free;
/// mixed-case inputs must match the checksum casing exactly.
///
/// # Errors
///
/// - `InvalidAddress` for wrong length or non-hex characters
/// - `ChecksumMismatch` for mixed-case input with wrong casing
pub fn parse_checksum_hex(input: &str) -> Result<[u8; 20], CryptoError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    if stripped.len() != 40 {
        return Err(CryptoError::InvalidAddress(input.to_string()));
    }

    let bytes =
        hex::decode(stripped).map_err(|_| CryptoError::InvalidAddress(input.to_string()))?;
    let mut address = [0u8; 20];
    address.copy_from_slice(&bytes);

    let has_upper = stripped.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = stripped.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower && to_checksum_hex(&address) != format!("0x{stripped}") {
        return Err(CryptoError::ChecksumMismatch(input.to_string()));
    }

    Ok(address)
}
