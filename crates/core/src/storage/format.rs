use crate::errors::CoreError;
use super::encryption::{KdfParams, NONCE_LEN, SALT_LEN};

/// Magic bytes identifying a gold ledger file.
pub const MAGIC: &[u8; 4] = b"GLDG";

pub const CURRENT_VERSION: u16 = 1;

/// magic(4) + version(2) + kdf(12) + salt(16) + nonce(12) + payload_len(8)
pub const HEADER_LEN: usize = 4 + 2 + 12 + SALT_LEN + NONCE_LEN + 8;

/// Everything needed to re-derive the key and open the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerHeader {
    pub version: u16,
    pub kdf: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
}

/// Serialize header and sealed payload.
///
/// ```text
/// [GLDG] [version u16] [memory_kib u32] [iterations u32] [lanes u32]
/// [salt 16B] [nonce 12B] [payload_len u64] [payload]
/// ```
/// All integers are little-endian.
pub fn encode(header: &LedgerHeader, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&header.version.to_le_bytes());
    for field in [header.kdf.memory_kib, header.kdf.iterations, header.kdf.lanes] {
        buf.extend_from_slice(&field.to_le_bytes());
    }
    buf.extend_from_slice(&header.salt);
    buf.extend_from_slice(&header.nonce);
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Parse the header and return it with the payload slice.
///
/// Trailing bytes after the declared payload are ignored.
pub fn decode(data: &[u8]) -> Result<(LedgerHeader, &[u8]), CoreError> {
    if data.len() < HEADER_LEN {
        return Err(CoreError::InvalidFileFormat(format!(
            "{} bytes is too short for a ledger header",
            data.len()
        )));
    }

    let mut reader = ByteReader::new(data);
    if &reader.take::<4>()? != MAGIC {
        return Err(CoreError::InvalidFileFormat("missing GLDG magic".into()));
    }

    let version = u16::from_le_bytes(reader.take()?);
    if version == 0 || version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let kdf = KdfParams {
        memory_kib: u32::from_le_bytes(reader.take()?),
        iterations: u32::from_le_bytes(reader.take()?),
        lanes: u32::from_le_bytes(reader.take()?),
    };
    kdf.check_bounds()?;

    let salt = reader.take()?;
    let nonce = reader.take()?;
    let payload_len = u64::from_le_bytes(reader.take()?);
    let payload = reader.slice(payload_len)?;

    Ok((
        LedgerHeader {
            version,
            kdf,
            salt,
            nonce,
        },
        payload,
    ))
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CoreError> {
        let bytes = self.slice(N as u64)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn slice(&mut self, len: u64) -> Result<&'a [u8], CoreError> {
        let remaining = self.data.len() - self.pos;
        let len = usize::try_from(len)
            .ok()
            .filter(|l| *l <= remaining)
            .ok_or_else(|| {
                CoreError::InvalidFileFormat(format!(
                    "truncated: need {len} bytes at offset {}, {remaining} left",
                    self.pos
                ))
            })?;
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }
}
