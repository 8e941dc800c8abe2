//! Admin/buyer identity: an Ed25519 keypair derived from a BIP-39 mnemonic at
//! the Sui derivation path, plus transaction signing over the intent digest.

use crate::error::{OpsError, Result};
use crate::tx::types::SuiAddress;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type Blake2b256 = Blake2b<U32>;
type HmacSha512 = Hmac<Sha512>;

/// Hardened-only SLIP-0010 path used by Sui wallets: m/44'/784'/0'/0'/0'.
const DERIVATION_PATH: [u32; 5] = [44, 784, 0, 0, 0];

/// Scheme flag prepended to public keys and signatures.
const ED25519_FLAG: u8 = 0x00;

/// Intent bytes for signing transaction data (scope, version, app id).
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

pub struct Keypair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Keypair {
    /// Derive the keypair the original scripts obtained from
    /// `Ed25519Keypair.deriveKeypair(phrase)`.
    pub fn derive(mnemonic: &str) -> Result<Self> {
        let mnemonic = bip39::Mnemonic::parse_in_normalized(bip39::Language::English, mnemonic)
            .map_err(|e| OpsError::KeyDerivation(format!("invalid mnemonic: {}", e)))?;
        let seed = mnemonic.to_seed("");

        // SLIP-0010 for ed25519: every step is hardened.
        let mut output = hmac_sha512(b"ed25519 seed", &seed);
        for index in DERIVATION_PATH {
            let hardened = 0x8000_0000u32 | index;
            let mut data = Vec::with_capacity(37);
            data.push(0u8);
            data.extend_from_slice(&output[..32]);
            data.extend_from_slice(&hardened.to_be_bytes());
            output = hmac_sha512(&output[32..], &data);
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&output[..32]);
        let signing_key = SigningKey::from_bytes(&secret);
        let verifying_key = signing_key.verifying_key();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    pub fn address(&self) -> SuiAddress {
        let mut hasher = Blake2b256::new();
        hasher.update([ED25519_FLAG]);
        hasher.update(self.verifying_key.as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        SuiAddress(out)
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign BCS transaction bytes. Returns the serialized signature the
    /// execute endpoint expects: base64 of `flag || signature || public key`.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(tx_bytes);
        let digest = hasher.finalize();

        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.verifying_key.as_bytes());
        BASE64.encode(serialized)
    }
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_derivation_matches_known_vector() {
        let keypair = Keypair::derive(TEST_MNEMONIC).unwrap();
        assert_eq!(
            hex::encode(keypair.public_key_bytes()),
            "900b4d81eecea3df2f74b14200c4f4cf3f49afaca7a634ffd2cf6ff82bdaecf2"
        );
        assert_eq!(
            keypair.address().to_string(),
            "0x5e93a736d04fbb25737aa40bee40171ef79f65fae833749e3c089fe7cc2161f1"
        );
    }

    #[test]
    fn test_bad_mnemonic_rejected() {
        assert!(Keypair::derive("not a mnemonic at all").is_err());
    }

    #[test]
    fn test_signature_layout_and_verifies() {
        let keypair = Keypair::derive(TEST_MNEMONIC).unwrap();
        let tx_bytes = b"example transaction bytes";
        let serialized = BASE64.decode(keypair.sign_transaction(tx_bytes)).unwrap();

        assert_eq!(serialized.len(), 97);
        assert_eq!(serialized[0], ED25519_FLAG);
        assert_eq!(&serialized[65..], keypair.verifying_key.as_bytes());

        // The signature covers the intent digest, not the raw bytes
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(tx_bytes);
        let digest = hasher.finalize();
        let signature = ed25519_dalek::Signature::from_slice(&serialized[1..65]).unwrap();
        assert!(keypair.verifying_key.verify(&digest, &signature).is_ok());
    }

    #[test]
    fn test_same_mnemonic_same_address() {
        let a = Keypair::derive(TEST_MNEMONIC).unwrap();
        let b = Keypair::derive(TEST_MNEMONIC).unwrap();
        assert_eq!(a.address(), b.address());
    }
}
