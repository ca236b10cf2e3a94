//! Surfaces built on a paint device
//!
//! A [`RasterSurface`] is anything that owns a [`PaintDevice`] and can say
//! what kind of surface it is. Selection masks are the one specialization:
//! an 8-bit coverage device where 255 means fully selected.

use raster_config::TileConfig;

use crate::constants::{OPACITY_OPAQUE_U8, OPACITY_TRANSPARENT_U8};
use crate::device::PaintDevice;
use crate::encoding::alpha8;
use crate::error::RasterError;
use crate::types::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Generic,
    Selection,
}

pub trait RasterSurface {
    fn kind(&self) -> SurfaceKind;

    fn paint_device(&self) -> &PaintDevice;

    fn paint_device_mut(&mut self) -> &mut PaintDevice;

    /// The selection mask behind this surface, if it is one
    fn as_selection(&self) -> Option<&SelectionMask> {
        None
    }
}

impl RasterSurface for PaintDevice {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Generic
    }

    fn paint_device(&self) -> &PaintDevice {
        self
    }

    fn paint_device_mut(&mut self) -> &mut PaintDevice {
        self
    }
}

/// Per-pixel selection coverage
#[derive(Debug, Clone)]
pub struct SelectionMask {
    device: PaintDevice,
}

impl SelectionMask {
    pub fn new() -> Self {
        Self::with_config(TileConfig::default())
    }

    pub fn with_config(tiles: TileConfig) -> Self {
        Self {
            device: PaintDevice::with_config(alpha8(), tiles),
        }
    }

    pub fn select_rect(&mut self, rect: Rect) -> Result<(), RasterError> {
        self.device.fill_bytes(rect, &[OPACITY_OPAQUE_U8])
    }

    pub fn deselect_rect(&mut self, rect: Rect) -> Result<(), RasterError> {
        self.device.clear_rect(rect)?;
        self.device.purge(rect);
        Ok(())
    }

    /// Smallest rect holding every selected pixel
    pub fn selected_exact_rect(&self) -> Rect {
        self.device.exact_bounds()
    }

    /// Coverage of `(x, y)`: 0 unselected, 255 fully selected
    pub fn selectedness(&self, x: i32, y: i32) -> u8 {
        self.device
            .random_accessor_const(x, y)
            .raw_data_const()
            .first()
            .copied()
            .unwrap_or(OPACITY_TRANSPARENT_U8)
    }

    pub fn is_selected(&self, x: i32, y: i32) -> bool {
        self.selectedness(x, y) != OPACITY_TRANSPARENT_U8
    }

    pub fn clear(&mut self) {
        self.device.clear();
    }

    pub fn device(&self) -> &PaintDevice {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut PaintDevice {
        &mut self.device
    }
}

impl Default for SelectionMask {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSurface for SelectionMask {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Selection
    }

    fn paint_device(&self) -> &PaintDevice {
        &self.device
    }

    fn paint_device_mut(&mut self) -> &mut PaintDevice {
        &mut self.device
    }

    fn as_selection(&self) -> Option<&SelectionMask> {
        Some(self)
    }
}
