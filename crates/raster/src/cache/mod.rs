//! Derived values of a device that are expensive to recompute

mod lock_free;

pub use lock_free::LockFreeCache;

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use tracing::trace;

use crate::encoding::{ConversionFlags, RenderingIntent};
use crate::types::Rect;

/// What a cached thumbnail was requested with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThumbnailKey {
    pub max_width: u32,
    pub max_height: u32,
    pub intent: RenderingIntent,
    pub flags: ConversionFlags,
}

impl ThumbnailKey {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            intent: RenderingIntent::default(),
            flags: ConversionFlags::default(),
        }
    }
}

/// Exact bounds, region and thumbnails of one device.
///
/// Every field is either consistent with the device's pixels or stale.
/// [`invalidate`](Self::invalidate) makes all of them stale at once.
pub struct DerivedValueCache {
    exact_bounds: LockFreeCache<Rect>,
    region: LockFreeCache<Vec<Rect>>,
    generation: AtomicU64,
    thumbnails: RwLock<HashMap<ThumbnailKey, (u64, RgbaImage)>>,
}

impl DerivedValueCache {
    pub fn new() -> Self {
        Self {
            exact_bounds: LockFreeCache::new(),
            region: LockFreeCache::new(),
            generation: AtomicU64::new(0),
            thumbnails: RwLock::new(HashMap::new()),
        }
    }

    pub fn invalidate(&self) {
        self.exact_bounds.invalidate();
        self.region.invalidate();
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut thumbnails) = self.thumbnails.try_write() {
            thumbnails.clear();
        }
        trace!("derived values invalidated");
    }

    pub fn exact_bounds(&self, calculate: impl FnOnce() -> Rect) -> Rect {
        self.exact_bounds.get_value(calculate)
    }

    pub fn region(&self, calculate: impl FnOnce() -> Vec<Rect>) -> Vec<Rect> {
        self.region.get_value(calculate)
    }

    /// Generation a thumbnail must be stored under to be returned later
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Cached thumbnail requested with exactly `key`, if still current
    pub fn thumbnail(&self, key: &ThumbnailKey) -> Option<RgbaImage> {
        let generation = self.generation();
        let thumbnails = self.thumbnails.try_read().ok()?;
        match thumbnails.get(key) {
            Some((tag, image)) if *tag == generation => Some(image.clone()),
            _ => None,
        }
    }

    /// Remember a thumbnail computed under `generation`
    pub fn store_thumbnail(&self, key: ThumbnailKey, generation: u64, image: RgbaImage) {
        if generation != self.generation() {
            return;
        }
        if let Ok(mut thumbnails) = self.thumbnails.try_write() {
            thumbnails.insert(key, (generation, image));
        }
    }

    pub fn thumbnail_count(&self) -> usize {
        self.thumbnails.read().map(|t| t.len()).unwrap_or(0)
    }
}

impl Default for DerivedValueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DerivedValueCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedValueCache")
            .field("generation", &self.generation())
            .field("thumbnails", &self.thumbnail_count())
            .finish()
    }
}
