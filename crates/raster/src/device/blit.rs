//! Tile-sharing copies between devices with identical layout

use tracing::{debug, warn};

use super::PaintDevice;
use crate::error::RasterError;
use crate::tiles::TileStore;
use crate::types::Rect;

impl PaintDevice {
    /// Why `src` cannot be blitted into `self` tile for tile, if it cannot
    fn blit_incompatibility(&self, src: &PaintDevice) -> Option<String> {
        if self.offset != src.offset {
            return Some(format!("offsets differ: {:?} vs {:?}", self.offset, src.offset));
        }
        if self.encoding.id() != src.encoding.id() {
            return Some(format!(
                "encodings differ: {} vs {}",
                self.encoding.id(),
                src.encoding.id()
            ));
        }
        if !self.store.same_layout(&src.store) {
            return Some("tile geometry differs".to_string());
        }
        if self.store.default_pixel() != src.store.default_pixel() {
            return Some("default pixels differ".to_string());
        }
        if self.addressing() != src.addressing() {
            return Some("addressing differs".to_string());
        }
        None
    }

    /// Whether the fast blits below accept `src`
    pub fn fast_bit_blt_possible(&self, src: &PaintDevice) -> bool {
        self.blit_incompatibility(src).is_none()
    }

    fn check_blit(&self, src: &PaintDevice, op: &str) -> Result<(), RasterError> {
        match self.blit_incompatibility(src) {
            None => Ok(()),
            Some(reason) => {
                warn!("{}: refused, {}", op, reason);
                Err(RasterError::IncompatibleDevices(reason))
            }
        }
    }

    fn blit_from_store(&mut self, src: &TileStore, rect: Rect) -> Result<(), RasterError> {
        if rect.is_empty() {
            return Ok(());
        }
        self.apply_spans(rect, |store, span| store.bit_blt(src, span.src))?;
        self.invalidate_after_write(rect);
        Ok(())
    }

    /// Copy `rect` from `src`, sharing tiles it covers completely
    pub fn fast_bit_blt(&mut self, src: &PaintDevice, rect: Rect) -> Result<(), RasterError> {
        self.check_blit(src, "fast_bit_blt")?;
        self.blit_from_store(src.store(), rect)
    }

    /// Copy `rect` from the state `src` had when its transaction began
    pub fn fast_bit_blt_old_data(
        &mut self,
        src: &PaintDevice,
        rect: Rect,
    ) -> Result<(), RasterError> {
        self.check_blit(src, "fast_bit_blt_old_data")?;
        self.blit_from_store(src.old_store(), rect)
    }

    /// Share every tile of `src` that overlaps `rect`, including the pixels
    /// of edge tiles lying outside it
    pub fn fast_bit_blt_rough(&mut self, src: &PaintDevice, rect: Rect) -> Result<(), RasterError> {
        self.check_blit(src, "fast_bit_blt_rough")?;
        if rect.is_empty() {
            return Ok(());
        }
        let mut dirty = Rect::default();
        for span in self.store_spans(rect) {
            self.store.bit_blt_rough(&src.store, span.src);
            dirty = dirty.united(&self.store_tiles_rect(span.src));
        }
        self.invalidate_after_write(dirty);
        Ok(())
    }

    /// Device rect covered by the tiles overlapping store rect `rect`
    fn store_tiles_rect(&self, rect: Rect) -> Rect {
        self.store
            .tiles_in_rect(rect)
            .map(|coord| self.store.tile_rect(coord))
            .fold(Rect::default(), |acc, tile| acc.united(&tile))
            .translated(self.offset.x, self.offset.y)
    }

    /// Drop all content and adopt the geometry of `src`
    pub fn prepare_clone(&mut self, src: &PaintDevice) {
        let before = self.extent();
        self.store = TileStore::new(src.store.tile_config(), src.store.default_pixel());
        self.encoding = src.encoding.clone();
        self.offset = src.offset;
        self.default_bounds = src.default_bounds.clone();
        self.transaction_base = None;
        debug!("prepare_clone: adopted {} layout", src.encoding.id());
        self.invalidate_after_write(before);
    }

    /// Become a copy of `rect` of `src`; nothing outside `rect` is kept
    pub fn make_clone_from(&mut self, src: &PaintDevice, rect: Rect) -> Result<(), RasterError> {
        let mut staged = self.clone();
        staged.prepare_clone(src);
        staged.fast_bit_blt(src, rect)?;
        self.adopt_staged(staged);
        Ok(())
    }

    /// Become a copy of the tiles of `src` overlapping `rect`. Pixels of
    /// those tiles outside `rect` come along.
    pub fn make_clone_from_rough(&mut self, src: &PaintDevice, rect: Rect) -> Result<(), RasterError> {
        let mut staged = self.clone();
        staged.prepare_clone(src);
        staged.fast_bit_blt_rough(src, rect)?;
        self.adopt_staged(staged);
        Ok(())
    }

    fn adopt_staged(&mut self, staged: PaintDevice) {
        let before = self.extent();
        self.store = staged.store;
        self.encoding = staged.encoding;
        self.offset = staged.offset;
        self.default_bounds = staged.default_bounds;
        self.transaction_base = None;
        self.invalidate_after_write(before.united(&self.extent()));
    }
}
