//! Packed and planar byte I/O

use super::PaintDevice;
use crate::error::{RasterError, alloc_bytes};
use crate::types::Rect;

/// Byte offset of device pixel `(x, y)` in a row-major buffer covering `rect`
#[inline]
fn buffer_offset(rect: Rect, pixel_size: usize, x: i32, y: i32) -> usize {
    let stride = rect.width as usize * pixel_size;
    (y - rect.y) as usize * stride + (x - rect.x) as usize * pixel_size
}

impl PaintDevice {
    /// Packed row-major copy of `rect`; empty for an empty rect
    pub fn read_bytes(&self, rect: Rect) -> Result<Vec<u8>, RasterError> {
        if rect.is_empty() {
            return Ok(Vec::new());
        }
        let stride = rect.width as usize * self.pixel_size();
        let mut data = alloc_bytes(stride * rect.height as usize)?;
        for span in self.store_spans(rect) {
            let start = buffer_offset(rect, self.pixel_size(), span.dst.x, span.dst.y);
            self.store.read_rect(span.src, &mut data[start..], stride);
        }
        Ok(data)
    }

    /// Write packed row-major bytes over `rect`.
    ///
    /// `data` must hold exactly one pixel per coordinate of `rect`.
    pub fn write_bytes(&mut self, data: &[u8], rect: Rect) -> Result<(), RasterError> {
        if rect.is_empty() {
            return Ok(());
        }
        let stride = rect.width as usize * self.pixel_size();
        let expected = stride * rect.height as usize;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let pixel_size = self.pixel_size();
        self.apply_spans(rect, |store, span| {
            let start = buffer_offset(rect, pixel_size, span.dst.x, span.dst.y);
            store.write_rect(span.src, &data[start..], stride)
        })?;
        self.invalidate_after_write(rect);
        Ok(())
    }

    /// One buffer per channel, in channel order
    pub fn read_planar_bytes(&self, rect: Rect) -> Result<Vec<Vec<u8>>, RasterError> {
        let packed = self.read_bytes(rect)?;
        let pixel_size = self.pixel_size();
        let mut planes = Vec::with_capacity(self.encoding.channel_count());
        for channel in self.encoding.channels() {
            let mut plane = alloc_bytes(rect.area() * channel.size)?;
            for (dst, pixel) in plane
                .chunks_exact_mut(channel.size)
                .zip(packed.chunks_exact(pixel_size))
            {
                dst.copy_from_slice(&pixel[channel.offset..channel.offset + channel.size]);
            }
            planes.push(plane);
        }
        Ok(planes)
    }

    /// Write per-channel buffers over `rect`. A `None` plane leaves that
    /// channel as it is.
    pub fn write_planar_bytes(
        &mut self,
        planes: &[Option<&[u8]>],
        rect: Rect,
    ) -> Result<(), RasterError> {
        let channels = self.encoding.channels().to_vec();
        if planes.len() != channels.len() {
            return Err(RasterError::PlaneCount {
                expected: channels.len(),
                actual: planes.len(),
            });
        }
        for (channel, plane) in channels.iter().zip(planes) {
            if let Some(plane) = plane {
                let expected = rect.area() * channel.size;
                if plane.len() != expected {
                    return Err(RasterError::BufferSize {
                        expected,
                        actual: plane.len(),
                    });
                }
            }
        }
        if rect.is_empty() {
            return Ok(());
        }

        let mut packed = self.read_bytes(rect)?;
        let pixel_size = self.pixel_size();
        for (channel, plane) in channels.iter().zip(planes) {
            let Some(plane) = plane else {
                continue;
            };
            for (pixel, src) in packed
                .chunks_exact_mut(pixel_size)
                .zip(plane.chunks_exact(channel.size))
            {
                pixel[channel.offset..channel.offset + channel.size].copy_from_slice(src);
            }
        }
        self.write_bytes(&packed, rect)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::addressing::FixedBounds;
    use crate::encoding::{Color, rgba8, rgba16};

    #[test]
    fn test_write_bytes_size_checked() {
        let mut device = PaintDevice::new(rgba8());
        let err = device.write_bytes(&[0; 7], Rect::new(0, 0, 2, 1)).unwrap_err();
        assert!(matches!(err, RasterError::BufferSize { expected: 8, actual: 7 }));
    }

    #[test]
    fn test_read_bytes_wrapped_repeats() {
        let bounds = Arc::new(FixedBounds::wrapped(Rect::new(0, 0, 4, 4)));
        let mut device = PaintDevice::with_bounds(rgba8(), bounds);
        device.set_pixel(1, 0, &Color::white(rgba8())).unwrap();
        let row = device.read_bytes(Rect::new(-4, 0, 12, 1)).unwrap();
        let alphas: Vec<u8> = row.chunks_exact(4).map(|p| p[3]).collect();
        assert_eq!(alphas, vec![0, 255, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0]);
    }

    #[test]
    fn test_write_bytes_wrapped_lands_in_period() {
        let bounds = Arc::new(FixedBounds::wrapped(Rect::new(0, 0, 4, 4)));
        let mut device = PaintDevice::with_bounds(rgba8(), bounds);
        let data = [9u8; 4 * 4];
        device.write_bytes(&data, Rect::new(3, 3, 2, 2)).unwrap();
        for (x, y) in [(3, 3), (0, 3), (3, 0), (0, 0)] {
            assert_eq!(device.pixel(x, y).unwrap().data(), &[9, 9, 9, 9]);
        }
        assert_eq!(device.exact_bounds(), Rect::new(0, 0, 4, 4));
    }

    #[test]
    fn test_write_bytes_wrapped_keeps_each_span_source() {
        let bounds = Arc::new(FixedBounds::wrapped(Rect::new(0, 0, 4, 4)));
        let mut device = PaintDevice::with_bounds(rgba8(), bounds);
        let rect = Rect::new(2, 2, 4, 4);
        let data: Vec<u8> = (0..16u8).flat_map(|i| [i, i, i, 255]).collect();
        device.write_bytes(&data, rect).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let value = (y * 4 + x) as u8;
                let (px, py) = ((2 + x as i32).rem_euclid(4), (2 + y as i32).rem_euclid(4));
                assert_eq!(device.pixel(px, py).unwrap().data(), &[value, value, value, 255]);
            }
        }
        assert_eq!(device.read_bytes(rect).unwrap(), data);
    }

    #[test]
    fn test_planar_round_trip_with_missing_plane() {
        let mut device = PaintDevice::new(rgba16());
        let rect = Rect::new(10, 10, 3, 2);
        device
            .fill(rect, &Color::from_rgba8([10, 20, 30, 40], rgba16()))
            .unwrap();
        let planes = device.read_planar_bytes(rect).unwrap();
        assert_eq!(planes.len(), 4);
        assert_eq!(planes[0].len(), 6 * 2);

        let red = vec![0xffu8; 12];
        device
            .write_planar_bytes(&[Some(&red), None, None, None], rect)
            .unwrap();
        let pixel = device.pixel(11, 11).unwrap().to_rgba8();
        assert_eq!(pixel, [255, 20, 30, 40]);
    }

    #[test]
    fn test_planar_plane_count_checked() {
        let mut device = PaintDevice::new(rgba8());
        let err = device
            .write_planar_bytes(&[None, None], Rect::new(0, 0, 1, 1))
            .unwrap_err();
        assert!(matches!(err, RasterError::PlaneCount { expected: 4, actual: 2 }));
    }
}
