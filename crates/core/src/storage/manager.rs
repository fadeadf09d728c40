use log::debug;

use crate::errors::CoreError;
use crate::models::ledger::Ledger;

use super::encryption::{self, KdfParams, LedgerKey};
use super::format::{self, LedgerHeader};

/// Reads and writes password-protected ledger files.
///
/// Ledger → bincode → AES-256-GCM under an Argon2id key → `GLDG` container.
/// A fresh salt and nonce are drawn on every save.
pub struct StorageManager;

impl StorageManager {
    pub fn save_to_bytes(ledger: &Ledger, password: &str) -> Result<Vec<u8>, CoreError> {
        let plaintext = bincode::serialize(ledger)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize ledger: {e}")))?;

        let header = LedgerHeader {
            version: format::CURRENT_VERSION,
            kdf: KdfParams::default(),
            salt: encryption::random_bytes()?,
            nonce: encryption::random_bytes()?,
        };
        let key = LedgerKey::derive(password, &header.salt, &header.kdf)?;
        let sealed = key.seal(&plaintext, &header.nonce)?;

        debug!(
            "Sealed ledger: {} transactions, {} history points, {} bytes",
            ledger.transactions.len(),
            ledger.history.len(),
            sealed.len()
        );
        Ok(format::encode(&header, &sealed))
    }

    pub fn load_from_bytes(data: &[u8], password: &str) -> Result<Ledger, CoreError> {
        let (header, sealed) = format::decode(data)?;
        let key = LedgerKey::derive(password, &header.salt, &header.kdf)?;
        let plaintext = key.open(sealed, &header.nonce)?;

        bincode::deserialize(&plaintext)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize ledger: {e}")))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(ledger: &Ledger, path: &str, password: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(ledger, password)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<Ledger, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes, password)
    }
}
