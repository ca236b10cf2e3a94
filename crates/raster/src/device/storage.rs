//! Storage snapshots, transactions and tile dumps

use std::io::{Read, Write};

use tracing::{debug, info, warn};

use super::PaintDevice;
use crate::encoding::EncodingRef;
use crate::error::RasterError;
use crate::tiles::TileStore;

/// Pixel storage detached from a device.
///
/// Holding a snapshot keeps its tiles alive and shared; a device that later
/// writes to those tiles copies them first.
#[derive(Clone)]
pub struct StorageSnapshot {
    pub(crate) store: TileStore,
    pub(crate) encoding: EncodingRef,
}

impl StorageSnapshot {
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn encoding(&self) -> &EncodingRef {
        &self.encoding
    }
}

impl std::fmt::Debug for StorageSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSnapshot")
            .field("encoding", &self.encoding.id())
            .field("store", &self.store)
            .finish()
    }
}

impl PaintDevice {
    /// O(1) copy of the current storage
    pub fn snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            store: self.store.clone(),
            encoding: self.encoding.clone(),
        }
    }

    /// Exchange the device storage with `snapshot`.
    ///
    /// Any open transaction is dropped: its base no longer describes the
    /// pixels the device holds.
    pub fn swap_storage(&mut self, snapshot: &mut StorageSnapshot) {
        let before = self.extent();
        std::mem::swap(&mut self.store, &mut snapshot.store);
        std::mem::swap(&mut self.encoding, &mut snapshot.encoding);
        if self.transaction_base.take().is_some() {
            debug!("swap_storage: open transaction dropped");
        }
        self.invalidate_after_write(before.united(&self.extent()));
    }

    /// Remember the current storage so that `old_raw_data` reads it and the
    /// transaction can be reverted. Restarts an open transaction.
    pub fn begin_transaction(&mut self) {
        self.transaction_base = Some(self.store.clone());
    }

    pub fn has_transaction(&self) -> bool {
        self.transaction_base.is_some()
    }

    /// Close the transaction, returning the storage it started from
    pub fn commit_transaction(&mut self) -> Option<StorageSnapshot> {
        let store = self.transaction_base.take()?;
        Some(StorageSnapshot {
            store,
            encoding: self.encoding.clone(),
        })
    }

    /// Drop every change since [`begin_transaction`](Self::begin_transaction).
    /// Returns `false` without a transaction.
    pub fn revert_transaction(&mut self) -> bool {
        let Some(base) = self.transaction_base.take() else {
            return false;
        };
        let before = self.extent();
        self.store = base;
        self.invalidate_after_write(before.united(&self.extent()));
        true
    }

    /// Write the tile dump of the current storage
    pub fn write(&self, writer: &mut impl Write) -> Result<(), RasterError> {
        self.store.write_to(writer)?;
        info!(
            "Wrote {} tiles of {}",
            self.store.tile_count(),
            self.name().unwrap_or("unnamed device")
        );
        Ok(())
    }

    /// Replace the storage with a tile dump.
    ///
    /// The device is left untouched when the dump cannot be read.
    pub fn read(&mut self, reader: &mut impl Read) -> Result<(), RasterError> {
        let store = match TileStore::read_from(reader, self.pixel_size()) {
            Ok(store) => store,
            Err(e) => {
                warn!("Failed to read tile dump: {}", e);
                return Err(e.into());
            }
        };
        let before = self.extent();
        self.store = store;
        self.transaction_base = None;
        info!("Read {} tiles", self.store.tile_count());
        self.invalidate_after_write(before.united(&self.extent()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Color, alpha8, rgba8};
    use crate::types::Rect;

    fn painted() -> PaintDevice {
        let mut device = PaintDevice::new(rgba8());
        device
            .fill(Rect::new(0, 0, 100, 30), &Color::from_rgba8([1, 2, 3, 255], rgba8()))
            .unwrap();
        device
    }

    #[test]
    fn test_revert_transaction() {
        let mut device = painted();
        device.begin_transaction();
        device.clear_rect(Rect::new(0, 0, 10, 10)).unwrap();
        assert_eq!(device.random_accessor_const(5, 5).old_raw_data(), &[1, 2, 3, 255]);
        assert_eq!(device.pixel(5, 5).unwrap().opacity_u8(), 0);
        assert!(device.revert_transaction());
        assert_eq!(device.pixel(5, 5).unwrap().data(), &[1, 2, 3, 255]);
        assert!(!device.revert_transaction());
    }

    #[test]
    fn test_commit_returns_base() {
        let mut device = painted();
        device.begin_transaction();
        device.clear();
        let base = device.commit_transaction().unwrap();
        assert!(!device.has_transaction());
        assert_eq!(base.store().tile_count(), 2);
        assert_eq!(device.store().tile_count(), 0);
    }

    #[test]
    fn test_swap_storage_twice_restores() {
        let mut device = painted();
        let mut other = PaintDevice::new(alpha8()).snapshot();
        device.swap_storage(&mut other);
        assert_eq!(device.encoding().id(), "ALPHA8");
        assert!(device.exact_bounds().is_empty());
        device.swap_storage(&mut other);
        assert_eq!(device.encoding().id(), "RGBA8");
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 100, 30));
    }

    #[test]
    fn test_dump_round_trip() {
        let device = painted();
        let mut bytes = Vec::new();
        device.write(&mut bytes).unwrap();

        let mut restored = PaintDevice::new(rgba8());
        restored.read(&mut bytes.as_slice()).unwrap();
        assert_eq!(restored.exact_bounds(), Rect::new(0, 0, 100, 30));
        assert_eq!(restored.pixel(99, 29).unwrap().data(), &[1, 2, 3, 255]);
    }

    #[test]
    fn test_failed_read_leaves_device() {
        let mut device = painted();
        let garbage = b"NOPE and some more bytes";
        assert!(matches!(
            device.read(&mut garbage.as_slice()),
            Err(RasterError::Dump(_))
        ));
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 100, 30));
    }
}
