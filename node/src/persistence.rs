// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Store snapshot file.
//!
//! Layout: `[MAGIC][VER][META_LEN][META_JSON][STORE_JSON][CRC32]`, all
//! integers little-endian, CRC over everything before it.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use wheretomeetup::error::StoreError;
use wheretomeetup::store::MemoryStore;

const MAGIC: u32 = 0x5754_4D55; // WTMU
const SCHEMA_VERSION: u32 = 1;
const HEADER_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Snapshot too short")]
    Truncated,
    #[error("Invalid magic bytes in header")]
    InvalidMagic,
    #[error("Unsupported snapshot version {0}")]
    Version(u32),
    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: u32, found: u32 },
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotMeta {
    pub version: u32,
    pub timestamp: u64,
    pub store_len: u64,
}

pub struct SnapshotManager;

impl SnapshotManager {
    pub fn save(path: &Path, store_data: &[u8]) -> Result<SnapshotMeta, PersistenceError> {
        let tmp_path = path.with_extension("tmp");
        let meta = SnapshotMeta {
            version: SCHEMA_VERSION,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            store_len: store_data.len() as u64,
        };

        {
            let mut file = File::create(&tmp_path)?;
            let mut hasher = Hasher::new();

            let meta_json = serde_json::to_vec(&meta).map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;
            let meta_len = meta_json.len() as u32;

            let mut write_chunk = |data: &[u8]| -> io::Result<()> {
                file.write_all(data)?;
                hasher.update(data);
                Ok(())
            };

            write_chunk(&MAGIC.to_le_bytes())?;
            write_chunk(&SCHEMA_VERSION.to_le_bytes())?;
            write_chunk(&meta_len.to_le_bytes())?;
            write_chunk(&meta_json)?;
            write_chunk(store_data)?;

            let checksum = hasher.finalize();
            file.write_all(&checksum.to_le_bytes())?;
            file.sync_all()?;
        }

        // Keep one previous version
        if path.exists() {
            let prev_path = path.with_extension("prev");
            if let Err(e) = std::fs::rename(path, &prev_path) {
                tracing::warn!("Could not rotate previous snapshot to {:?}: {}", prev_path, e);
            }
        }

        std::fs::rename(tmp_path, path)?;
        Ok(meta)
    }

    pub fn parse(buffer: &[u8]) -> Result<(SnapshotMeta, Vec<u8>), PersistenceError> {
        if buffer.len() < HEADER_LEN + 4 {
            return Err(PersistenceError::Truncated);
        }

        let (content, trailer) = buffer.split_at(buffer.len() - 4);
        let stored_crc = read_u32(trailer, 0);

        let mut hasher = Hasher::new();
        hasher.update(content);
        let computed = hasher.finalize();
        if computed != stored_crc {
            return Err(PersistenceError::ChecksumMismatch {
                expected: stored_crc,
                found: computed,
            });
        }

        if read_u32(content, 0) != MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }
        let version = read_u32(content, 4);
        if version != SCHEMA_VERSION {
            return Err(PersistenceError::Version(version));
        }

        let meta_end = HEADER_LEN + read_u32(content, 8) as usize;
        if content.len() < meta_end {
            return Err(PersistenceError::Truncated);
        }
        let meta: SnapshotMeta = serde_json::from_slice(&content[HEADER_LEN..meta_end])
            .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

        let body = &content[meta_end..];
        if body.len() as u64 != meta.store_len {
            return Err(PersistenceError::InvalidFormat(format!(
                "Meta claims {} bytes, found {}",
                meta.store_len,
                body.len()
            )));
        }

        Ok((meta, body.to_vec()))
    }

    pub fn save_store(path: &Path, store: &MemoryStore) -> Result<SnapshotMeta, PersistenceError> {
        let data = store.snapshot()?;
        Self::save(path, &data)
    }

    pub fn load_store(path: &Path, store: &MemoryStore) -> Result<SnapshotMeta, PersistenceError> {
        let buffer = std::fs::read(path)?;
        let (meta, body) = Self::parse(&buffer)?;
        store.restore(&body)?;
        Ok(meta)
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(word)
}
