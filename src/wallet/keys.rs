use crate::core::field_size;
use crate::core::{Identifier, Signature};
use crate::error::{NyzoError, Result};
use crate::utils::{bytes_as_string_with_dashes, bytes_from_string_with_dashes};
use log::{debug, info};
use rand::RngCore;
use ring::signature::{Ed25519KeyPair, KeyPair as _, UnparsedPublicKey, ED25519};
use std::fs;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

// 8 groups of 8 hex characters plus 7 dashes, read generously
const KEY_FILE_PREFIX_LEN: usize = 80;

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; field_size::SEED]);

/// Ed25519 key provider for the local node.
///
/// Built once (from a seed, a key file, or fresh randomness) and passed by
/// reference wherever something must be signed.
pub struct KeyPair {
    seed: Seed,
    key_pair: Ed25519KeyPair,
    identifier: Identifier,
}

impl KeyPair {
    pub fn from_seed(seed: &[u8; field_size::SEED]) -> Result<KeyPair> {
        let key_pair = Ed25519KeyPair::from_seed_unchecked(seed)
            .map_err(|e| NyzoError::Crypto(format!("Seed rejected: {e}")))?;
        let mut public = [0u8; field_size::IDENTIFIER];
        public.copy_from_slice(key_pair.public_key().as_ref());
        Ok(KeyPair {
            seed: Seed(*seed),
            key_pair,
            identifier: Identifier(public),
        })
    }

    pub fn generate() -> Result<KeyPair> {
        let mut seed = [0u8; field_size::SEED];
        rand::thread_rng().fill_bytes(&mut seed);
        let key_pair = KeyPair::from_seed(&seed);
        seed.zeroize();
        key_pair
    }

    /// Read the seed from `path`, or generate one and write it there when the
    /// file does not exist yet.
    pub fn load_or_generate(path: &Path) -> Result<KeyPair> {
        if path.is_file() {
            return KeyPair::load(path);
        }

        info!("No key file, creating one into {}", path.display());
        let key_pair = KeyPair::generate()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, key_pair.seed_as_string())?;
        Ok(key_pair)
    }

    /// Parse a dash-grouped hex seed file
    pub fn load(path: &Path) -> Result<KeyPair> {
        let text = fs::read_to_string(path)
            .map_err(|e| NyzoError::KeyFile(format!("{}: {e}", path.display())))?;
        let prefix: String = text.chars().take(KEY_FILE_PREFIX_LEN).collect();
        let mut decoded = bytes_from_string_with_dashes(&prefix)?;
        if decoded.len() != field_size::SEED {
            let len = decoded.len();
            decoded.zeroize();
            return Err(NyzoError::KeyFile(format!(
                "{}: expected {} seed bytes, found {len}",
                path.display(),
                field_size::SEED
            )));
        }
        let mut seed = [0u8; field_size::SEED];
        seed.copy_from_slice(&decoded);
        decoded.zeroize();
        let key_pair = KeyPair::from_seed(&seed);
        seed.zeroize();
        key_pair
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let mut signature = [0u8; field_size::SIGNATURE];
        signature.copy_from_slice(self.key_pair.sign(message).as_ref());
        Signature(signature)
    }

    fn seed_as_string(&self) -> String {
        bytes_as_string_with_dashes(&self.seed.0)
    }
}

/// True when `signature` is `identifier`'s Ed25519 signature over `message`.
pub fn verify_signature(signature: &Signature, message: &[u8], identifier: &Identifier) -> bool {
    let public_key = UnparsedPublicKey::new(&ED25519, identifier.as_bytes());
    match public_key.verify(message, signature.as_bytes()) {
        Ok(()) => true,
        Err(_) => {
            debug!("Signature check failed for {identifier}");
            false
        }
    }
}
