//! Tile dump persistence
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic        [u8; 4]   "RTLS"
//! version      u16
//! tile_width   u32
//! tile_height  u32
//! pixel_size   u32
//! default      [u8; pixel_size]
//! tile_count   u32
//! tile_count x { col i32, row i32, len u32, bytes [u8; len] }
//! ```
//!
//! A record may carry more than one tile's worth of bytes; the surplus is
//! skipped so later versions can append per-tile data.

use std::io::{self, Read, Write};
use std::sync::Arc;

use raster_config::TileConfig;
use tracing::{debug, warn};

use super::{Tile, TileStore};
use crate::constants::{DUMP_MAGIC, DUMP_VERSION, MAX_DUMP_TILE_BYTES};
use crate::types::TileCoord;

/// Errors raised while writing or reading a tile dump
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Not a tile dump (bad magic)")]
    BadMagic,

    #[error("Unsupported dump version {0}")]
    UnsupportedVersion(u16),

    #[error("Invalid dump geometry: {0}")]
    Geometry(String),

    #[error("Out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },
}

fn read_array<const N: usize>(reader: &mut impl Read) -> Result<[u8; N], DumpError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u32(reader: &mut impl Read) -> Result<u32, DumpError> {
    Ok(u32::from_le_bytes(read_array(reader)?))
}

fn read_i32(reader: &mut impl Read) -> Result<i32, DumpError> {
    Ok(i32::from_le_bytes(read_array(reader)?))
}

fn read_bytes(reader: &mut impl Read, len: usize) -> Result<Vec<u8>, DumpError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| DumpError::OutOfMemory { bytes: len })?;
    data.resize(len, 0);
    reader.read_exact(&mut data)?;
    Ok(data)
}

impl TileStore {
    /// Serialize the default pixel and every materialized tile
    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), DumpError> {
        let coords = self.materialized_coords();
        writer.write_all(&DUMP_MAGIC)?;
        writer.write_all(&DUMP_VERSION.to_le_bytes())?;
        writer.write_all(&(self.tile_width as u32).to_le_bytes())?;
        writer.write_all(&(self.tile_height as u32).to_le_bytes())?;
        writer.write_all(&(self.pixel_size as u32).to_le_bytes())?;
        writer.write_all(&self.default_pixel)?;
        writer.write_all(&(coords.len() as u32).to_le_bytes())?;
        for coord in &coords {
            let data = self.tile_for_read(*coord).data();
            writer.write_all(&coord.col.to_le_bytes())?;
            writer.write_all(&coord.row.to_le_bytes())?;
            writer.write_all(&(data.len() as u32).to_le_bytes())?;
            writer.write_all(data)?;
        }
        debug!("write_to: {} tiles", coords.len());
        Ok(())
    }

    /// Build a new store from a dump.
    ///
    /// `pixel_size` is what the caller's encoding expects; a dump with a
    /// different pixel size is rejected.
    pub fn read_from(reader: &mut impl Read, pixel_size: usize) -> Result<TileStore, DumpError> {
        if read_array::<4>(reader)? != DUMP_MAGIC {
            return Err(DumpError::BadMagic);
        }
        let version = u16::from_le_bytes(read_array(reader)?);
        if version == 0 || version > DUMP_VERSION {
            warn!("read_from: unsupported dump version {}", version);
            return Err(DumpError::UnsupportedVersion(version));
        }
        let tile_width = read_u32(reader)?;
        let tile_height = read_u32(reader)?;
        let dump_pixel_size = read_u32(reader)? as usize;
        let max_edge = i32::MAX as u32;
        if tile_width == 0 || tile_height == 0 || tile_width > max_edge || tile_height > max_edge {
            return Err(DumpError::Geometry(format!(
                "tile size {}x{}",
                tile_width, tile_height
            )));
        }
        if dump_pixel_size != pixel_size {
            return Err(DumpError::Geometry(format!(
                "pixel size {} (expected {})",
                dump_pixel_size, pixel_size
            )));
        }
        let tile_bytes = (tile_width as usize)
            .checked_mul(tile_height as usize)
            .and_then(|count| count.checked_mul(pixel_size))
            .filter(|bytes| *bytes <= MAX_DUMP_TILE_BYTES)
            .ok_or_else(|| {
                DumpError::Geometry(format!(
                    "tile size {}x{} at {} bytes per pixel",
                    tile_width, tile_height, pixel_size
                ))
            })?;
        let default_pixel = read_bytes(reader, pixel_size)?;
        let config = TileConfig {
            width: tile_width,
            height: tile_height,
        };
        let mut store = TileStore::try_new(config, &default_pixel)
            .map_err(|_| DumpError::OutOfMemory { bytes: tile_bytes })?;
        let count = read_u32(reader)?;
        for _ in 0..count {
            let col = read_i32(reader)?;
            let row = read_i32(reader)?;
            let len = read_u32(reader)? as usize;
            if len < tile_bytes {
                return Err(DumpError::Geometry(format!(
                    "tile ({}, {}) has {} bytes, expected {}",
                    col, row, len, tile_bytes
                )));
            }
            let data = read_bytes(reader, tile_bytes)?;
            let surplus = (len - tile_bytes) as u64;
            if surplus > 0 {
                let skipped = io::copy(&mut reader.by_ref().take(surplus), &mut io::sink())?;
                if skipped != surplus {
                    return Err(DumpError::Io(io::ErrorKind::UnexpectedEof.into()));
                }
            }
            store.set_tile(TileCoord::new(col, row), Some(Arc::new(Tile::from_vec(data))));
        }
        debug!("read_from: version {} -> {} tiles", version, count);
        Ok(store)
    }
}
