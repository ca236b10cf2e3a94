//! Encoding conversion and composition source devices

use tracing::{debug, info};

use super::PaintDevice;
use super::storage::StorageSnapshot;
use crate::encoding::{ConversionFlags, EncodingRef, RenderingIntent, same_encoding};
use crate::error::{RasterError, alloc_bytes};
use crate::tiles::TileStore;
use crate::types::Rect;

/// Undo record of one encoding conversion.
///
/// Holds the storage that is currently *not* in the device; undo and redo
/// both swap it back in, so either takes O(1).
#[derive(Debug)]
pub struct ConversionCommand {
    snapshot: Option<StorageSnapshot>,
    applied: bool,
}

impl ConversionCommand {
    fn noop() -> Self {
        Self {
            snapshot: None,
            applied: true,
        }
    }

    /// True when source and target encodings were the same
    pub fn is_noop(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Restore the pre-conversion storage
    pub fn undo(&mut self, device: &mut PaintDevice) {
        if !self.applied {
            return;
        }
        if let Some(snapshot) = self.snapshot.as_mut() {
            device.swap_storage(snapshot);
        }
        self.applied = false;
    }

    pub fn redo(&mut self, device: &mut PaintDevice) {
        if self.applied {
            return;
        }
        if let Some(snapshot) = self.snapshot.as_mut() {
            device.swap_storage(snapshot);
        }
        self.applied = true;
    }
}

impl PaintDevice {
    /// Convert every pixel into `encoding`.
    ///
    /// The new storage is built row by row next to the old one and swapped
    /// in at the end, so a failure leaves the device as it was.
    pub fn convert_to(
        &mut self,
        encoding: EncodingRef,
        intent: RenderingIntent,
        flags: ConversionFlags,
    ) -> Result<ConversionCommand, RasterError> {
        if same_encoding(self.encoding.as_ref(), encoding.as_ref()) {
            debug!("convert_to: already {}", encoding.id());
            return Ok(ConversionCommand::noop());
        }

        let mut default_pixel = alloc_bytes(encoding.pixel_size())?;
        self.encoding.convert_pixels_to(
            self.store.default_pixel(),
            &mut default_pixel,
            encoding.as_ref(),
            1,
            intent,
            flags,
        );
        let mut converted = TileStore::try_new(self.store.tile_config(), &default_pixel)?;

        let bounds = self
            .exact_bounds()
            .translated(-self.offset.x, -self.offset.y);
        if !bounds.is_empty() {
            let width = bounds.width as usize;
            let mut src_row = alloc_bytes(width * self.pixel_size())?;
            let mut dst_row = alloc_bytes(width * encoding.pixel_size())?;
            let (src_stride, dst_stride) = (src_row.len(), dst_row.len());
            for y in bounds.y..bounds.y_end() {
                let row = Rect::new(bounds.x, y, bounds.width, 1);
                self.store.read_rect(row, &mut src_row, src_stride);
                self.encoding.convert_pixels_to(
                    &src_row,
                    &mut dst_row,
                    encoding.as_ref(),
                    width,
                    intent,
                    flags,
                );
                converted.write_rect(row, &dst_row, dst_stride)?;
            }
        }

        info!(
            "Converted {} -> {} ({} tiles)",
            self.encoding.id(),
            encoding.id(),
            converted.tile_count()
        );
        let mut snapshot = StorageSnapshot {
            store: converted,
            encoding,
        };
        self.swap_storage(&mut snapshot);
        Ok(ConversionCommand {
            snapshot: Some(snapshot),
            applied: true,
        })
    }

    /// Empty device that other content can be composited into before it
    /// lands on `self`: same encoding, tile geometry, default pixel, bounds
    /// and offset.
    pub fn create_composition_source_device(&self) -> PaintDevice {
        let mut device = PaintDevice::with_config(self.encoding.clone(), self.store.tile_config());
        device.store = TileStore::new(self.store.tile_config(), self.store.default_pixel());
        device.default_bounds = self.default_bounds.clone();
        device.offset = self.offset;
        device
    }

    /// Copy of `source` in this device's encoding and bounds
    pub fn create_composition_source_device_with(
        &self,
        source: &PaintDevice,
    ) -> Result<PaintDevice, RasterError> {
        let mut device = source.clone();
        device.convert_to(
            self.encoding.clone(),
            RenderingIntent::default(),
            ConversionFlags::default(),
        )?;
        device.set_default_bounds(self.default_bounds.clone());
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Color, alpha8, rgba8, rgba16};
    use crate::types::Point;

    #[test]
    fn test_same_encoding_is_noop() {
        let mut device = PaintDevice::new(rgba8());
        let command = device
            .convert_to(rgba8(), RenderingIntent::default(), ConversionFlags::default())
            .unwrap();
        assert!(command.is_noop());
        assert!(command.is_applied());
    }

    #[test]
    fn test_convert_undo_redo() {
        let mut device = PaintDevice::new(rgba8());
        let color = Color::from_rgba8([255, 128, 0, 255], rgba8());
        device.fill(Rect::new(0, 0, 70, 10), &color).unwrap();
        let before = device.snapshot();

        let mut command = device
            .convert_to(rgba16(), RenderingIntent::Perceptual, ConversionFlags::default())
            .unwrap();
        assert_eq!(device.pixel_size(), 8);
        assert_eq!(device.pixel(69, 9).unwrap().to_rgba8(), [255, 128, 0, 255]);
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 70, 10));

        command.undo(&mut device);
        assert!(!command.is_applied());
        assert_eq!(device.encoding().id(), "RGBA8");
        assert!(device.store().same_layout(before.store()));
        assert_eq!(device.pixel(0, 0).unwrap().data(), &[255, 128, 0, 255]);

        command.redo(&mut device);
        assert_eq!(device.encoding().id(), "RGBA16");
    }

    #[test]
    fn test_convert_moved_device() {
        let mut device = PaintDevice::new(rgba8());
        device.move_to(-30, 40).unwrap();
        device
            .fill(Rect::new(-30, 40, 5, 5), &Color::white(rgba8()))
            .unwrap();
        device
            .convert_to(alpha8(), RenderingIntent::default(), ConversionFlags::default())
            .unwrap();
        assert_eq!(device.exact_bounds(), Rect::new(-30, 40, 5, 5));
        assert_eq!(device.pixel(-26, 44).unwrap().data(), &[255]);
    }

    #[test]
    fn test_composition_source_matches_target() {
        let mut target = PaintDevice::new(rgba16());
        target.move_to(3, 4).unwrap();
        let empty = target.create_composition_source_device();
        assert_eq!(empty.encoding().id(), "RGBA16");
        assert_eq!(empty.offset(), Point::new(3, 4));
        assert!(empty.extent().is_empty());

        let mut source = PaintDevice::new(rgba8());
        source
            .fill(Rect::new(0, 0, 2, 2), &Color::white(rgba8()))
            .unwrap();
        let copy = target.create_composition_source_device_with(&source).unwrap();
        assert_eq!(copy.encoding().id(), "RGBA16");
        assert_eq!(copy.exact_bounds(), Rect::new(0, 0, 2, 2));
        assert_eq!(source.encoding().id(), "RGBA8");
    }
}
