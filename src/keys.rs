use solana_sdk::signature::Keypair;
use solana_sdk::signer::keypair::keypair_from_seed;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

/// Number of leading secret bytes used as the ed25519 seed.
pub const SEED_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("secret is not valid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("secret decodes to {len} bytes, cannot derive a keypair: {reason}")]
    Seed { len: usize, reason: String },
}

/// Decodes a base58 secret into the seed bytes used for key derivation.
///
/// Anything past the first 32 bytes is dropped, so both a bare seed and a
/// full 64 byte keypair export resolve to the same key. Shorter secrets are
/// returned whole.
pub fn seed_from_secret(secret: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let mut decoded = Zeroizing::new(bs58::decode(secret.trim()).into_vec()?);
    if decoded.len() > SEED_LEN {
        debug!(
            "Secret decoded to {} bytes, using the first {} as seed",
            decoded.len(),
            SEED_LEN
        );
        decoded.truncate(SEED_LEN);
    }
    Ok(decoded)
}

/// Derives a keypair from a base58 secret using the 32 byte seed rule.
pub fn keypair_from_secret(secret: &str) -> Result<Keypair, KeyError> {
    let seed = seed_from_secret(secret)?;
    keypair_from_seed(&seed).map_err(|e| KeyError::Seed {
        len: seed.len(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    fn encode(bytes: &[u8]) -> String {
        bs58::encode(bytes).into_string()
    }

    #[test]
    fn exact_seed_derives_keypair() {
        let seed = [7u8; 32];
        let expected = keypair_from_seed(&seed).unwrap();
        let keypair = keypair_from_secret(&encode(&seed)).unwrap();
        assert_eq!(keypair.pubkey(), expected.pubkey());
    }

    #[test]
    fn full_keypair_export_resolves_to_same_key() {
        let original = Keypair::new();
        let keypair = keypair_from_secret(&original.to_base58_string()).unwrap();
        assert_eq!(keypair.pubkey(), original.pubkey());
    }

    #[test]
    fn only_first_32_bytes_determine_the_key() {
        let mut first = vec![3u8; 32];
        first.extend_from_slice(&[1u8; 40]);
        let mut second = vec![3u8; 32];
        second.extend_from_slice(&[9u8; 8]);

        let a = keypair_from_secret(&encode(&first)).unwrap();
        let b = keypair_from_secret(&encode(&second)).unwrap();
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn short_secret_is_kept_whole() {
        let seed = seed_from_secret(&encode(&[5u8; 20])).unwrap();
        assert_eq!(seed.len(), 20);
    }

    #[test]
    fn short_secret_cannot_derive_keypair() {
        let err = keypair_from_secret(&encode(&[5u8; 20])).unwrap_err();
        assert!(matches!(err, KeyError::Seed { len: 20, .. }));
    }

    #[test]
    fn invalid_base58_is_rejected() {
        let err = keypair_from_secret("not-base58-0OIl").unwrap_err();
        assert!(matches!(err, KeyError::Base58(_)));
    }
}
