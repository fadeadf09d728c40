// ═══════════════════════════════════════════════════════════════════
// Storage Tests: key derivation, GLDG container, StorageManager
// ═══════════════════════════════════════════════════════════════════

use chrono::{NaiveDate, TimeZone, Utc};

use gold_tracker_core::errors::CoreError;
use gold_tracker_core::models::ledger::Ledger;
use gold_tracker_core::models::quote::{HistoryInstrument, HistoryPoint, MarketQuote, QuoteSnapshot};
use gold_tracker_core::models::transaction::{Instrument, Transaction};
use gold_tracker_core::storage::encryption::{random_bytes, KdfParams, LedgerKey, NONCE_LEN, SALT_LEN};
use gold_tracker_core::storage::format::{self, LedgerHeader, CURRENT_VERSION, HEADER_LEN, MAGIC};
use gold_tracker_core::storage::manager::StorageManager;

/// Cheap parameters so key derivation does not dominate the test run.
fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        lanes: 1,
    }
}

fn header() -> LedgerHeader {
    LedgerHeader {
        version: CURRENT_VERSION,
        kdf: fast_kdf(),
        salt: [7u8; SALT_LEN],
        nonce: [9u8; NONCE_LEN],
    }
}

fn sample_ledger() -> Ledger {
    let mut ledger = Ledger::default();
    ledger.transactions.push(
        Transaction::buy(
            Instrument::Bar,
            Some("SJC".into()),
            2.0,
            8_000_000.0,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
        .with_note("lương tháng 1"),
    );
    ledger.transactions.push(Transaction::gift_in(
        Instrument::Other("coin_24k".into()),
        None,
        0.5,
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
    ));
    ledger.quotes = QuoteSnapshot::new(
        vec![MarketQuote::new("SJC (Miếng)", 82_000_000.0, 84_000_000.0, "09:00 01/03/2024")],
        Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap(),
    );
    ledger.history.merge(&[HistoryPoint::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        HistoryInstrument::Ring9999,
        75_000_000.0,
        77_000_000.0,
    )]);
    ledger.settings.canonical_brand = "DOJI".into();
    ledger
}

// ═══════════════════════════════════════════════════════════════════
// KdfParams
// ═══════════════════════════════════════════════════════════════════

mod kdf_params {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        assert!(KdfParams::default().check_bounds().is_ok());
    }

    #[test]
    fn out_of_range_values_rejected() {
        let too_much_memory = KdfParams {
            memory_kib: 2_000_000,
            ..fast_kdf()
        };
        assert!(matches!(too_much_memory.check_bounds(), Err(CoreError::InvalidFileFormat(_))));

        let zero_iterations = KdfParams {
            iterations: 0,
            ..fast_kdf()
        };
        assert!(zero_iterations.check_bounds().is_err());

        let too_many_lanes = KdfParams { lanes: 64, ..fast_kdf() };
        assert!(too_many_lanes.check_bounds().is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
// LedgerKey
// ═══════════════════════════════════════════════════════════════════

mod ledger_key {
    use super::*;

    #[test]
    fn seal_then_open() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];
        let key = LedgerKey::derive("hunter2", &salt, &fast_kdf()).unwrap();
        let sealed = key.seal(b"gold", &nonce).unwrap();
        assert_ne!(sealed, b"gold");
        assert_eq!(sealed.len(), 4 + 16);
        assert_eq!(key.open(&sealed, &nonce).unwrap(), b"gold");
    }

    #[test]
    fn wrong_password_fails_to_open() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];
        let sealed = LedgerKey::derive("right", &salt, &fast_kdf())
            .unwrap()
            .seal(b"gold", &nonce)
            .unwrap();
        let wrong = LedgerKey::derive("wrong", &salt, &fast_kdf()).unwrap();
        assert!(matches!(wrong.open(&sealed, &nonce), Err(CoreError::Decryption)));
    }

    #[test]
    fn tampering_is_detected() {
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];
        let key = LedgerKey::derive("pw", &salt, &fast_kdf()).unwrap();
        let mut sealed = key.seal(b"gold", &nonce).unwrap();
        sealed[0] ^= 0x01;
        assert!(matches!(key.open(&sealed, &nonce), Err(CoreError::Decryption)));
    }

    #[test]
    fn random_bytes_differ() {
        let a: [u8; SALT_LEN] = random_bytes().unwrap();
        let b: [u8; SALT_LEN] = random_bytes().unwrap();
        assert_ne!(a, b);
    }
}

// ═══════════════════════════════════════════════════════════════════
// GLDG container
// ═══════════════════════════════════════════════════════════════════

mod container {
    use super::*;

    #[test]
    fn layout() {
        let bytes = format::encode(&header(), b"payload");
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(&bytes[4..6], &CURRENT_VERSION.to_le_bytes());
        assert_eq!(bytes.len(), HEADER_LEN + 7);
        assert_eq!(&bytes[HEADER_LEN..], b"payload");
    }

    #[test]
    fn decode_returns_header_and_payload() {
        let bytes = format::encode(&header(), b"payload");
        let (decoded, payload) = format::decode(&bytes).unwrap();
        assert_eq!(decoded, header());
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut bytes = format::encode(&header(), b"abc");
        bytes.extend_from_slice(b"junk");
        let (_, payload) = format::decode(&bytes).unwrap();
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn too_short() {
        assert!(matches!(format::decode(b"GLDG"), Err(CoreError::InvalidFileFormat(_))));
    }

    #[test]
    fn wrong_magic() {
        let mut bytes = format::encode(&header(), b"abc");
        bytes[0..4].copy_from_slice(b"SVTK");
        assert!(matches!(format::decode(&bytes), Err(CoreError::InvalidFileFormat(_))));
    }

    #[test]
    fn unsupported_versions() {
        for version in [0u16, CURRENT_VERSION + 1] {
            let mut h = header();
            h.version = version;
            let bytes = format::encode(&h, b"abc");
            assert!(matches!(format::decode(&bytes), Err(CoreError::UnsupportedVersion(v)) if v == version));
        }
    }

    #[test]
    fn hostile_kdf_params_rejected() {
        let mut h = header();
        h.kdf.memory_kib = u32::MAX;
        let bytes = format::encode(&h, b"abc");
        assert!(matches!(format::decode(&bytes), Err(CoreError::InvalidFileFormat(_))));
    }

    #[test]
    fn truncated_payload() {
        let bytes = format::encode(&header(), b"a longer payload");
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(format::decode(cut), Err(CoreError::InvalidFileFormat(_))));
    }

    #[test]
    fn absurd_payload_length() {
        let mut bytes = format::encode(&header(), b"abc");
        let len_at = HEADER_LEN - 8;
        bytes[len_at..HEADER_LEN].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(format::decode(&bytes), Err(CoreError::InvalidFileFormat(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
// StorageManager
// ═══════════════════════════════════════════════════════════════════

mod manager {
    use super::*;

    #[test]
    fn bytes_round_trip_preserves_ledger() {
        let ledger = sample_ledger();
        let bytes = StorageManager::save_to_bytes(&ledger, "mật khẩu").unwrap();
        assert_eq!(&bytes[0..4], MAGIC);

        let loaded = StorageManager::load_from_bytes(&bytes, "mật khẩu").unwrap();
        assert_eq!(loaded.transactions, ledger.transactions);
        assert_eq!(loaded.settings, ledger.settings);
        assert_eq!(loaded.quotes.quotes, ledger.quotes.quotes);
        assert_eq!(loaded.quotes.fetched_at, ledger.quotes.fetched_at);
        assert_eq!(loaded.history.points(), ledger.history.points());
    }

    #[test]
    fn wrong_password() {
        let bytes = StorageManager::save_to_bytes(&Ledger::default(), "right").unwrap();
        assert!(matches!(
            StorageManager::load_from_bytes(&bytes, "wrong"),
            Err(CoreError::Decryption)
        ));
    }

    #[test]
    fn fresh_salt_each_save() {
        let ledger = Ledger::default();
        let a = StorageManager::save_to_bytes(&ledger, "pw").unwrap();
        let b = StorageManager::save_to_bytes(&ledger, "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vang.gldg");
        let path = path.to_str().unwrap();

        StorageManager::save_to_file(&sample_ledger(), path, "pw").unwrap();
        let loaded = StorageManager::load_from_file(path, "pw").unwrap();
        assert_eq!(loaded.transactions.len(), 2);
        assert_eq!(loaded.transactions[1].instrument, Instrument::Other("coin_24k".into()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.gldg");
        assert!(matches!(
            StorageManager::load_from_file(path.to_str().unwrap(), "pw"),
            Err(CoreError::FileIO(_))
        ));
    }
}
