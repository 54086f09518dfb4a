//! Segment image codec
//!
//! Encodes a segment as a flat, checksummed byte image and decodes it
//! back. Nothing here touches the filesystem.
//!
//! ## Image Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "LSMS" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Payload (variable)                                      │
//! │   bincode sequence of (key, Value(v) | Tombstone)       │
//! │   in strictly ascending key order                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   PayloadCRC: u32                                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are little-endian.

use bytes::{BufMut, Bytes};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LsmError, Result};
use crate::memtable::Entry;

use super::Segment;

/// Magic bytes identifying a segment image
pub const MAGIC: &[u8; 4] = b"LSMS";

/// Current image format version
pub const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub const HEADER_SIZE: usize = 14;

/// Footer size: PayloadCRC (4)
pub const FOOTER_SIZE: usize = 4;

impl<K, V> Segment<K, V>
where
    K: Ord + Serialize,
    V: Serialize,
{
    /// Encode this segment as a self-describing image
    pub fn encode(&self) -> Result<Bytes> {
        let payload = bincode::serialize(self.entries())?;
        let crc = crc32fast::hash(&payload);

        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(HEADER_SIZE + payload.len() + FOOTER_SIZE)?;

        buf.put_slice(MAGIC);
        buf.put_u16_le(VERSION);
        buf.put_u64_le(self.len() as u64);
        buf.put_slice(&payload);
        buf.put_u32_le(crc);

        Ok(Bytes::from(buf))
    }
}

impl<K, V> Segment<K, V>
where
    K: Ord + DeserializeOwned,
    V: DeserializeOwned,
{
    /// Decode an image produced by [`Segment::encode`]
    ///
    /// Validates magic, version, checksum, entry count and key order.
    pub fn decode(id: u64, image: &[u8]) -> Result<Self> {
        if image.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(LsmError::Corruption(format!(
                "image too short: {} bytes",
                image.len()
            )));
        }

        if &image[0..4] != MAGIC {
            return Err(LsmError::Corruption(format!(
                "invalid magic: expected LSMS, got {:?}",
                &image[0..4]
            )));
        }

        let version = u16::from_le_bytes([image[4], image[5]]);
        if version != VERSION {
            return Err(LsmError::Corruption(format!(
                "unsupported image version: {}",
                version
            )));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&image[6..HEADER_SIZE]);
        let entry_count = u64::from_le_bytes(count_bytes);

        let footer_start = image.len() - FOOTER_SIZE;
        let payload = &image[HEADER_SIZE..footer_start];

        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&image[footer_start..]);
        let stored_crc = u32::from_le_bytes(crc_bytes);
        let actual_crc = crc32fast::hash(payload);
        if stored_crc != actual_crc {
            return Err(LsmError::Corruption(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, actual_crc
            )));
        }

        let entries: Vec<(K, Entry<V>)> = bincode::deserialize(payload)?;
        if entries.len() as u64 != entry_count {
            return Err(LsmError::Corruption(format!(
                "entry count mismatch: header says {}, payload holds {}",
                entry_count,
                entries.len()
            )));
        }

        Segment::new(id, entries)
    }
}
