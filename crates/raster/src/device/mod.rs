//! Paint device: one tile store, one encoding, an offset and derived values
//!
//! Impl blocks are split by concern:
//! - `geometry` - offset, extent, exact bounds, region, crop
//! - `painting` - single pixels, fills, clears, default pixel, selection clear
//! - `bytes` - packed and planar byte I/O
//! - `blit` - fast tile-sharing copies between compatible devices
//! - `conversion` - encoding conversion with O(1) undo
//! - `storage` - snapshots, transactions, tile dumps
//! - `image_io` - conversion to and from `image::RgbaImage`
//! - `thumbnail` - nearest-neighbour thumbnails
//! - `update_info` - texture tile patches for the display layer

mod blit;
mod bytes;
mod conversion;
mod geometry;
mod image_io;
mod painting;
mod storage;
mod thumbnail;
mod update_info;

pub use conversion::ConversionCommand;
pub use storage::StorageSnapshot;
pub use thumbnail::fit_thumbnail_size;
pub use update_info::{TextureTileUpdate, UpdateInfo};

use std::fmt;
use std::sync::{Arc, Weak};

use raster_config::{EngineConfig, TileConfig};
use tracing::trace;

use crate::accessors::{
    LineConstIterator, LineIterator, Locator, Orientation, RandomAccessor, RandomConstAccessor,
    RandomSubAccessor, RectConstIterator, RectIterator, RepeatLineConstIterator,
};
use crate::addressing::{Addressing, DefaultBounds, FixedBounds, WrappedSpan};
use crate::cache::DerivedValueCache;
use crate::encoding::EncodingRef;
use crate::error::RasterError;
use crate::tiles::TileStore;
use crate::types::{Point, Rect};

/// Receives dirty rects from a device, e.g. the layer tree owning it
pub trait DirtyNotifier: Send + Sync {
    fn set_dirty(&self, rect: Rect);
}

/// Paintable pixel surface
///
/// `Clone` is shallow: tiles are shared copy-on-write, so the clone is cheap
/// and writes on either side stay isolated. The clone gets a fresh derived
/// value cache, no parent and no open transaction.
pub struct PaintDevice {
    pub(crate) store: TileStore,
    pub(crate) encoding: EncodingRef,
    pub(crate) offset: Point,
    pub(crate) default_bounds: Arc<dyn DefaultBounds>,
    pub(crate) parent: Option<Weak<dyn DirtyNotifier>>,
    pub(crate) transaction_base: Option<TileStore>,
    pub(crate) cache: DerivedValueCache,
    name: Option<String>,
}

impl PaintDevice {
    /// Device with default tile geometry, a transparent default pixel and
    /// the default bounds provider
    pub fn new(encoding: EncodingRef) -> Self {
        Self::with_config(encoding, TileConfig::default())
    }

    pub fn with_config(encoding: EncodingRef, tiles: TileConfig) -> Self {
        let default_pixel = encoding.transparent_pixel();
        Self {
            store: TileStore::new(tiles, &default_pixel),
            encoding,
            offset: Point::default(),
            default_bounds: Arc::new(FixedBounds::default()),
            parent: None,
            transaction_base: None,
            cache: DerivedValueCache::new(),
            name: None,
        }
    }

    pub fn from_engine_config(encoding: EncodingRef, config: &EngineConfig) -> Self {
        Self::with_config(encoding, config.tiles)
    }

    pub fn with_bounds(encoding: EncodingRef, bounds: Arc<dyn DefaultBounds>) -> Self {
        let mut device = Self::new(encoding);
        device.default_bounds = bounds;
        device
    }

    #[inline]
    pub fn encoding(&self) -> &EncodingRef {
        &self.encoding
    }

    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.store.pixel_size()
    }

    /// Tile storage, read-only
    #[inline]
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    #[inline]
    pub(crate) fn store_mut(&mut self) -> &mut TileStore {
        &mut self.store
    }

    /// Storage as it was when the open transaction began, or the current
    /// storage without one
    #[inline]
    pub fn old_store(&self) -> &TileStore {
        self.transaction_base.as_ref().unwrap_or(&self.store)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn default_bounds(&self) -> &Arc<dyn DefaultBounds> {
        &self.default_bounds
    }

    /// Switching bounds may switch addressing, so derived values go stale
    pub fn set_default_bounds(&mut self, bounds: Arc<dyn DefaultBounds>) {
        self.default_bounds = bounds;
        self.cache.invalidate();
    }

    pub fn set_parent(&mut self, parent: Weak<dyn DirtyNotifier>) {
        self.parent = Some(parent);
    }

    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    /// Report `rect` to the parent, if it is still alive
    pub fn set_dirty(&self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            parent.set_dirty(rect);
        }
    }

    /// Called after every pixel-changing operation
    pub(crate) fn invalidate_after_write(&self, dirty: Rect) {
        trace!(
            "invalidate_after_write: ({}, {}) {}x{}",
            dirty.x, dirty.y, dirty.width, dirty.height
        );
        self.cache.invalidate();
        self.set_dirty(dirty);
    }

    /// Addressing derived from the current bounds provider
    pub fn addressing(&self) -> Addressing {
        Addressing::from_bounds(self.default_bounds.as_ref())
    }

    pub fn locator(&self) -> Locator {
        Locator::new(self.addressing(), self.offset, &self.store)
    }

    /// `rect` split by the addressing, with `src` in store coordinates
    pub(crate) fn store_spans(&self, rect: Rect) -> Vec<WrappedSpan> {
        let (dx, dy) = (self.offset.x.saturating_neg(), self.offset.y.saturating_neg());
        self.addressing()
            .split_rect(rect)
            .into_iter()
            .map(|span| WrappedSpan {
                dst: span.dst,
                src: span.src.translated(dx, dy),
            })
            .collect()
    }

    /// Run a store operation over every span of `rect`.
    ///
    /// With several spans the work happens on a shallow copy of the store
    /// that replaces the original only if every span succeeded.
    pub(crate) fn apply_spans(
        &mut self,
        rect: Rect,
        mut op: impl FnMut(&mut TileStore, WrappedSpan) -> Result<(), RasterError>,
    ) -> Result<(), RasterError> {
        let spans = self.store_spans(rect);
        match spans.as_slice() {
            [] => Ok(()),
            [span] => op(&mut self.store, *span),
            _ => {
                let mut staged = self.store.clone();
                for span in spans {
                    op(&mut staged, span)?;
                }
                self.store = staged;
                Ok(())
            }
        }
    }

    pub fn random_accessor_const(&self, x: i32, y: i32) -> RandomConstAccessor<'_> {
        RandomConstAccessor::new(self, x, y)
    }

    pub fn random_accessor(&mut self, x: i32, y: i32) -> RandomAccessor<'_> {
        RandomAccessor::new(self, x, y)
    }

    pub fn h_line_iterator_const(&self, x: i32, y: i32, width: i32) -> LineConstIterator<'_> {
        LineConstIterator::new(self, Rect::new(x, y, width, 1), Orientation::Horizontal)
    }

    pub fn h_line_iterator(&mut self, x: i32, y: i32, width: i32) -> LineIterator<'_> {
        LineIterator::new(self, Rect::new(x, y, width, 1), Orientation::Horizontal)
    }

    pub fn v_line_iterator_const(&self, x: i32, y: i32, height: i32) -> LineConstIterator<'_> {
        LineConstIterator::new(self, Rect::new(x, y, 1, height), Orientation::Vertical)
    }

    pub fn v_line_iterator(&mut self, x: i32, y: i32, height: i32) -> LineIterator<'_> {
        LineIterator::new(self, Rect::new(x, y, 1, height), Orientation::Vertical)
    }

    /// Line iterator over every row (or column) of `rect`
    pub fn line_iterator_const(&self, rect: Rect, orientation: Orientation) -> LineConstIterator<'_> {
        LineConstIterator::new(self, rect, orientation)
    }

    pub fn line_iterator(&mut self, rect: Rect, orientation: Orientation) -> LineIterator<'_> {
        LineIterator::new(self, rect, orientation)
    }

    pub fn rect_iterator_const(&self, rect: Rect) -> RectConstIterator<'_> {
        RectConstIterator::new(self, rect)
    }

    pub fn rect_iterator(&mut self, rect: Rect) -> RectIterator<'_> {
        RectIterator::new(self, rect)
    }

    /// Row of `width` pixels that repeats the edges of `data_rect` when it
    /// runs past them
    pub fn repeat_h_line_iterator_const(
        &self,
        x: i32,
        y: i32,
        width: i32,
        data_rect: Rect,
    ) -> RepeatLineConstIterator<'_> {
        RepeatLineConstIterator::new(
            self,
            Rect::new(x, y, width, 1),
            Orientation::Horizontal,
            data_rect,
        )
    }

    pub fn repeat_v_line_iterator_const(
        &self,
        x: i32,
        y: i32,
        height: i32,
        data_rect: Rect,
    ) -> RepeatLineConstIterator<'_> {
        RepeatLineConstIterator::new(
            self,
            Rect::new(x, y, 1, height),
            Orientation::Vertical,
            data_rect,
        )
    }

    pub fn random_sub_accessor(&self) -> RandomSubAccessor<'_> {
        RandomSubAccessor::new(self)
    }

    /// Copy with no tile shared with `self`
    pub fn deep_clone(&self) -> Result<PaintDevice, RasterError> {
        let mut device = self.clone();
        device.store = self.store.deep_clone()?;
        Ok(device)
    }
}

impl Clone for PaintDevice {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            encoding: self.encoding.clone(),
            offset: self.offset,
            default_bounds: Arc::clone(&self.default_bounds),
            parent: None,
            transaction_base: None,
            cache: DerivedValueCache::new(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for PaintDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintDevice")
            .field("name", &self.name)
            .field("encoding", &self.encoding.id())
            .field("offset", &self.offset)
            .field("store", &self.store)
            .field("transaction", &self.transaction_base.is_some())
            .finish()
    }
}
