//! Tiled raster storage engine
//!
//! This crate provides the storage that backs every paintable surface:
//! - [`tiles::TileStore`] - Sparse copy-on-write grid of fixed-size tiles
//! - [`encoding`] - Pixel encodings ("color spaces") and [`encoding::Color`]
//! - [`addressing::Addressing`] - Plain and wrap-around coordinate mapping
//! - [`accessors`] - Random accessors, line and rect iterators
//! - [`cache`] - Derived value cache and the lock-free single-slot cell
//! - [`device::PaintDevice`] - Facade tying the pieces together
//! - [`surface`] - Surface capability trait and selection masks

pub mod accessors;
pub mod addressing;
pub mod cache;
pub mod constants;
pub mod device;
pub mod encoding;
pub mod error;
pub mod surface;
pub mod tiles;
pub mod types;

pub use accessors::*;
pub use addressing::*;
pub use cache::*;
pub use constants::*;
pub use device::*;
pub use encoding::*;
pub use error::*;
pub use surface::*;
pub use tiles::*;
pub use types::*;

pub use raster_config::{EngineConfig, TextureConfig, TileConfig};
