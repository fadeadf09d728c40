use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::errors::CoreError;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters, written into every ledger header so older
/// files stay readable after the defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl KdfParams {
    /// Bounds accepted when reading a header; a crafted file must not be able
    /// to request gigabytes of memory or minutes of hashing.
    pub const MEMORY_KIB_RANGE: std::ops::RangeInclusive<u32> = 8..=1_048_576;
    pub const ITERATIONS_RANGE: std::ops::RangeInclusive<u32> = 1..=20;
    pub const LANES_RANGE: std::ops::RangeInclusive<u32> = 1..=16;

    pub fn check_bounds(&self) -> Result<(), CoreError> {
        let checks = [
            ("memory_kib", self.memory_kib, &Self::MEMORY_KIB_RANGE),
            ("iterations", self.iterations, &Self::ITERATIONS_RANGE),
            ("lanes", self.lanes, &Self::LANES_RANGE),
        ];
        for (field, value, range) in checks {
            if !range.contains(&value) {
                return Err(CoreError::InvalidFileFormat(format!(
                    "KDF {field} out of range: {value} (expected {}..={})",
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            lanes: 1,
        }
    }
}

/// AES-256-GCM key derived from the ledger password.
pub struct LedgerKey([u8; KEY_LEN]);

impl LedgerKey {
    pub fn derive(password: &str, salt: &[u8; SALT_LEN], params: &KdfParams) -> Result<Self, CoreError> {
        let argon_params = Params::new(params.memory_kib, params.iterations, params.lanes, Some(KEY_LEN))
            .map_err(|e| CoreError::Encryption(format!("Invalid Argon2 params: {e}")))?;

        let mut key = [0u8; KEY_LEN];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
            .hash_password_into(password.as_bytes(), salt, &mut key)
            .map_err(|e| CoreError::Encryption(format!("Key derivation failed: {e}")))?;

        Ok(Self(key))
    }

    fn cipher(&self) -> Result<Aes256Gcm, CoreError> {
        Aes256Gcm::new_from_slice(&self.0).map_err(|e| CoreError::Encryption(format!("Bad key length: {e}")))
    }

    /// Encrypt; the 16-byte GCM tag is appended to the output.
    pub fn seal(&self, plaintext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CoreError> {
        self.cipher()?
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| CoreError::Encryption(format!("Encryption failed: {e}")))
    }

    /// Decrypt and verify the tag. A wrong password and a tampered file are
    /// indistinguishable here; both surface as [`CoreError::Decryption`].
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CoreError> {
        self.cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Decryption)
    }
}

/// Fresh random bytes from the OS (or `crypto.getRandomValues` on wasm).
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CoreError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| CoreError::Encryption(format!("No randomness available: {e}")))?;
    Ok(buf)
}
