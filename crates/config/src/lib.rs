//! Shared configuration for the tiled raster engine
//!
//! This crate is the single source of truth for tile geometry and for the
//! texture tiling used when extracting display updates. Nothing in the engine
//! hard-codes these numbers; everything flows from [`EngineConfig`].

use serde::{Deserialize, Serialize};

/// Default tile edge in pixels
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Default edge of a display texture tile in pixels (border included)
pub const DEFAULT_TEXTURE_SIZE: u32 = 256;

/// Default number of pixels replicated on each side of a texture tile
pub const DEFAULT_TEXTURE_BORDER: u32 = 1;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tile edge must be non-zero, got {width}x{height}")]
    ZeroTileSize { width: u32, height: u32 },

    #[error("Texture size {size} leaves no room for a border of {border} pixels")]
    BorderTooWide { size: u32, border: u32 },
}

/// Geometry of storage tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
        }
    }
}

impl TileConfig {
    /// Square tiles of the given edge
    pub fn square(edge: u32) -> Self {
        Self {
            width: edge,
            height: edge,
        }
    }

    /// Number of pixels in one tile
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Texture tiling used by the display layer when it pulls updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Full texture edge, border included
    pub texture_size: u32,
    /// Overlap replicated from neighbouring tiles on every side
    pub border: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            texture_size: DEFAULT_TEXTURE_SIZE,
            border: DEFAULT_TEXTURE_BORDER,
        }
    }
}

impl TextureConfig {
    /// Edge of the image area a texture tile is responsible for
    pub fn effective_size(&self) -> u32 {
        self.texture_size.saturating_sub(2 * self.border)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tiles: TileConfig,
    pub texture: TextureConfig,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiles.width == 0 || self.tiles.height == 0 {
            return Err(ConfigError::ZeroTileSize {
                width: self.tiles.width,
                height: self.tiles.height,
            });
        }
        if self.texture.texture_size <= 2 * self.texture.border {
            return Err(ConfigError::BorderTooWide {
                size: self.texture.texture_size,
                border: self.texture.border,
            });
        }
        Ok(())
    }
}
