//! Error types for raster storage operations.

use crate::tiles::DumpError;

/// Errors that can occur while reading or writing pixel storage.
///
/// Every variant leaves the device it was raised on in its prior,
/// pixel-consistent state.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Out of memory: failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("Pixel data has {actual} bytes, encoding expects {expected}")]
    PixelSize { expected: usize, actual: usize },

    #[error("Buffer holds {actual} bytes, operation needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Expected {expected} channel planes, got {actual}")]
    PlaneCount { expected: usize, actual: usize },

    #[error("Devices are not blit-compatible: {0}")]
    IncompatibleDevices(String),

    #[error("Tile dump error: {0}")]
    Dump(#[from] DumpError),
}

/// Allocate a zeroed byte buffer, reporting failure instead of aborting
pub(crate) fn alloc_bytes(len: usize) -> Result<Vec<u8>, RasterError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| RasterError::OutOfMemory { bytes: len })?;
    data.resize(len, 0);
    Ok(data)
}

/// Allocate a buffer holding `count` repetitions of `pattern`
pub(crate) fn alloc_pattern(pattern: &[u8], count: usize) -> Result<Vec<u8>, RasterError> {
    let len = pattern
        .len()
        .checked_mul(count)
        .ok_or(RasterError::OutOfMemory { bytes: usize::MAX })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| RasterError::OutOfMemory { bytes: len })?;
    for _ in 0..count {
        data.extend_from_slice(pattern);
    }
    Ok(data)
}

/// Allocate a copy of `src`
pub(crate) fn alloc_copy(src: &[u8]) -> Result<Vec<u8>, RasterError> {
    let mut data = Vec::new();
    data.try_reserve_exact(src.len())
        .map_err(|_| RasterError::OutOfMemory { bytes: src.len() })?;
    data.extend_from_slice(src);
    Ok(data)
}
