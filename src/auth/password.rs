use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::{auth::errors::AuthError, config::KdfConfig};

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 64;
const DELIMITER: char = ':';

/// Creates and checks `hex(salt):hex(key)` password hashes.
///
/// Keys come from Argon2id with the configured memory and iteration cost.
/// Every call is independent, so a store can be cloned freely across tasks.
#[derive(Clone)]
pub struct CredentialStore {
    kdf: Argon2<'static>,
    decoy: Arc<str>,
}

impl CredentialStore {
    pub fn new(cfg: &KdfConfig) -> Result<Self, AuthError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, Some(KEY_LEN))
            .map_err(|e| AuthError::Kdf(e.to_string()))?;
        let mut store = Self {
            kdf: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: Arc::from(""),
        };

        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        store.decoy = store.hash(&hex::encode(secret))?.into();
        Ok(store)
    }

    /// A well-formed hash of an unguessable password. Logins for unknown
    /// accounts verify against it so they pay the same derivation cost.
    pub fn decoy_hash(&self) -> &str {
        &self.decoy
    }

    fn derive_key(&self, password: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN], argon2::Error> {
        let mut key = [0u8; KEY_LEN];
        self.kdf.hash_password_into(password, salt, &mut key)?;
        Ok(key)
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let key = self.derive_key(password.as_bytes(), &salt).map_err(|e| {
            error!(error = %e, "argon2 key derivation error");
            AuthError::Kdf(e.to_string())
        })?;
        Ok(format!("{}{DELIMITER}{}", hex::encode(salt), hex::encode(key)))
    }

    /// Returns `false` for a wrong password and for any stored value that
    /// cannot be parsed. Never errors.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((salt_hex, key_hex)) = stored.split_once(DELIMITER) else {
            return false;
        };
        if salt_hex.is_empty() || key_hex.is_empty() {
            return false;
        }
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(key_hex)) else {
            return false;
        };

        let computed = match self.derive_key(password.as_bytes(), &salt) {
            Ok(k) => k,
            Err(e) => {
                warn!(error = %e, "stored password hash rejected by kdf");
                return false;
            }
        };

        // Key length is fixed and public; only the contents need constant time.
        if computed.len() != expected.len() {
            return false;
        }
        computed.as_slice().ct_eq(expected.as_slice()).into()
    }
}
