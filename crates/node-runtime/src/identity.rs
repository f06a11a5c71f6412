//! # Participant Identity
//!
//! The self-signed identity a node announces to the room. Created once
//! at startup from the configured seed (or a fresh random key) and
//! immutable for the process lifetime.

use crate::config::NodeConfig;
use shared_crypto::{CryptoError, MeritKeyPair};
use shared_types::Identity;

/// Build the node's keypair and signed identity from its configuration.
pub fn create_identity(config: &NodeConfig) -> Result<(MeritKeyPair, Identity), CryptoError> {
    let keypair = match &config.seed_hex {
        Some(seed_hex) => {
            let seed = hex::decode(seed_hex).map_err(|_| CryptoError::InvalidSeed {
                minimum: shared_crypto::derivation::MIN_SEED_LEN,
                actual: 0,
            })?;
            MeritKeyPair::from_seed(&seed)?
        }
        None => MeritKeyPair::generate(),
    };

    let mut identity = Identity {
        chain_id: config.params.chain_id.clone(),
        display_name: config.display_name.clone(),
        address: keypair.address(),
        role: config.role,
        public_key: keypair.public_key(),
        signature: [0u8; 64],
    };
    identity.signature = keypair.sign(&identity.signing_hash())?;

    Ok((keypair, identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_03_validation::verify_identity;

    #[test]
    fn test_identity_self_verifies() {
        let config = NodeConfig::for_testing();
        let (_keypair, identity) = create_identity(&config).unwrap();
        assert!(verify_identity(&identity));
        assert_eq!(identity.chain_id, config.params.chain_id);
    }

    #[test]
    fn test_seeded_identity_is_stable() {
        let mut config = NodeConfig::for_testing();
        config.seed_hex = Some("42".repeat(32));

        let (_, a) = create_identity(&config).unwrap();
        let (_, b) = create_identity(&config).unwrap();
        assert_eq!(a.address, b.address);
    }
}
