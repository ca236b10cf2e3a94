//! Texture tile patches for the display layer
//!
//! The display splits the image into textures of `effective_size` pixels,
//! each padded with `border` pixels of its neighbours so filtering at the
//! texture edge samples real content. A dirty rect therefore touches pixels
//! up to `border` outside itself.

use raster_config::TextureConfig;
use tracing::debug;

use super::PaintDevice;
use crate::encoding::{ConversionFlags, EncodingRef, RenderingIntent};
use crate::error::{RasterError, alloc_bytes};
use crate::types::Rect;

/// One texture's worth of changed pixels
#[derive(Debug, Clone)]
pub struct TextureTileUpdate {
    pub col: i32,
    pub row: i32,
    /// Full texture area including its border, clipped to the image bounds
    pub texture_rect: Rect,
    /// Part of `texture_rect` whose pixels are carried in `data`
    pub patch_rect: Rect,
    /// Packed row-major pixels of `patch_rect` in the update encoding
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UpdateInfo {
    pub dirty_rect: Rect,
    pub encoding: EncodingRef,
    pub tiles: Vec<TextureTileUpdate>,
}

impl UpdateInfo {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl PaintDevice {
    /// Patches for every display texture affected by `dirty`, converted
    /// into `dst_encoding`
    pub fn extract_update_info(
        &self,
        dirty: Rect,
        dst_encoding: &EncodingRef,
        config: &TextureConfig,
    ) -> Result<UpdateInfo, RasterError> {
        let bounds = self.default_bounds.bounds();
        let border = config.border as i32;
        let size = config.effective_size() as i32;
        let mut info = UpdateInfo {
            dirty_rect: dirty,
            encoding: dst_encoding.clone(),
            tiles: Vec::new(),
        };
        let artificial = dirty.stretched(border).intersected(&bounds);
        if artificial.is_empty() || size <= 0 {
            return Ok(info);
        }

        let first_col = (artificial.x - bounds.x).div_euclid(size);
        let last_col = (artificial.x_end() - 1 - bounds.x).div_euclid(size);
        let first_row = (artificial.y - bounds.y).div_euclid(size);
        let last_row = (artificial.y_end() - 1 - bounds.y).div_euclid(size);

        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let tile = Rect::new(bounds.x + col * size, bounds.y + row * size, size, size);
                let texture_rect = tile.stretched(border).intersected(&bounds);
                if !texture_rect.intersects(&dirty) {
                    continue;
                }
                let patch_rect = texture_rect.intersected(&artificial);
                let data = self.converted_bytes(patch_rect, dst_encoding)?;
                info.tiles.push(TextureTileUpdate {
                    col,
                    row,
                    texture_rect,
                    patch_rect,
                    data,
                });
            }
        }
        debug!(
            "extract_update_info: ({}, {}) {}x{} -> {} textures",
            dirty.x,
            dirty.y,
            dirty.width,
            dirty.height,
            info.tiles.len()
        );
        Ok(info)
    }

    fn converted_bytes(&self, rect: Rect, encoding: &EncodingRef) -> Result<Vec<u8>, RasterError> {
        let pixels = self.read_bytes(rect)?;
        if encoding.id() == self.encoding.id() {
            return Ok(pixels);
        }
        let count = rect.area();
        let mut data = alloc_bytes(count * encoding.pixel_size())?;
        self.encoding.convert_pixels_to(
            &pixels,
            &mut data,
            encoding.as_ref(),
            count,
            RenderingIntent::default(),
            ConversionFlags::default(),
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::addressing::FixedBounds;
    use crate::encoding::{Color, rgba8, rgba16};

    fn device() -> PaintDevice {
        let bounds = Arc::new(FixedBounds::new(Rect::new(0, 0, 100, 100)));
        let mut device = PaintDevice::with_bounds(rgba16(), bounds);
        device
            .fill(Rect::new(0, 0, 100, 100), &Color::white(rgba16()))
            .unwrap();
        device
    }

    fn config() -> TextureConfig {
        TextureConfig {
            texture_size: 12,
            border: 1,
        }
    }

    #[test]
    fn test_patch_stretched_by_border() {
        let device = device();
        let info = device
            .extract_update_info(Rect::new(22, 22, 5, 5), &rgba8(), &config())
            .unwrap();
        assert_eq!(info.tiles.len(), 1);
        let tile = &info.tiles[0];
        assert_eq!((tile.col, tile.row), (2, 2));
        assert_eq!(tile.texture_rect, Rect::new(19, 19, 12, 12));
        assert_eq!(tile.patch_rect, Rect::new(21, 21, 7, 7));
        assert_eq!(tile.data.len(), 7 * 7 * 4);
        assert_eq!(&tile.data[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_dirty_on_seam_reaches_neighbour_border() {
        let device = device();
        let info = device
            .extract_update_info(Rect::new(29, 25, 1, 1), &rgba8(), &config())
            .unwrap();
        let cols: Vec<i32> = info.tiles.iter().map(|t| t.col).collect();
        assert_eq!(cols, vec![2, 3]);
        assert_eq!(info.tiles[1].patch_rect, Rect::new(29, 24, 2, 3));
    }

    #[test]
    fn test_clipped_to_bounds() {
        let device = device();
        let info = device
            .extract_update_info(Rect::new(0, 0, 1, 1), &rgba8(), &config())
            .unwrap();
        assert_eq!(info.tiles.len(), 1);
        assert_eq!(info.tiles[0].texture_rect, Rect::new(0, 0, 11, 11));
        assert_eq!(info.tiles[0].patch_rect, Rect::new(0, 0, 2, 2));

        let outside = device
            .extract_update_info(Rect::new(500, 500, 4, 4), &rgba8(), &config())
            .unwrap();
        assert!(outside.is_empty());
    }
}
