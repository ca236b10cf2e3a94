/// Opacity of a fully transparent pixel.
pub const OPACITY_TRANSPARENT_U8: u8 = 0;

/// Opacity of a fully opaque pixel.
pub const OPACITY_OPAQUE_U8: u8 = 255;

/// Magic bytes opening a tile dump.
pub const DUMP_MAGIC: [u8; 4] = *b"RTLS";

/// Current tile dump version. Readers accept every version up to this one.
pub const DUMP_VERSION: u16 = 1;

/// Edge of the image area assumed when no bounds provider is attached.
pub const DEFAULT_BOUNDS_SIZE: i32 = 2048;

/// Largest tile, in bytes, a dump reader accepts.
pub const MAX_DUMP_TILE_BYTES: usize = 64 * 1024 * 1024;
