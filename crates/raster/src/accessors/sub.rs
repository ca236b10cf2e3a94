use crate::device::PaintDevice;
use crate::encoding::EncodingRef;
use crate::error::RasterError;

use super::RandomConstAccessor;

/// Samples a device at fractional coordinates.
///
/// Pixel `(x, y)` is taken to sit at exactly `(x, y)`; anything in between
/// is a bilinear blend of the four surrounding pixels, weighted by opacity
/// so transparent neighbours do not darken the result.
pub struct RandomSubAccessor<'a> {
    accessor: RandomConstAccessor<'a>,
    encoding: EncodingRef,
    x: f64,
    y: f64,
}

impl<'a> RandomSubAccessor<'a> {
    pub fn new(device: &'a PaintDevice) -> Self {
        Self {
            accessor: RandomConstAccessor::new(device, 0, 0),
            encoding: device.encoding().clone(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Blend of the current pixels at the sample point into `dst`
    pub fn sampled_raw_data(&mut self, dst: &mut [u8]) -> Result<(), RasterError> {
        self.sample(dst, false)
    }

    /// Same as [`sampled_raw_data`](Self::sampled_raw_data), reading the
    /// pixels as they were when the open transaction began
    pub fn sampled_old_raw_data(&mut self, dst: &mut [u8]) -> Result<(), RasterError> {
        self.sample(dst, true)
    }

    fn sample(&mut self, dst: &mut [u8], old: bool) -> Result<(), RasterError> {
        let pixel_size = self.encoding.pixel_size();
        if dst.len() != pixel_size {
            return Err(RasterError::PixelSize {
                expected: pixel_size,
                actual: dst.len(),
            });
        }
        let (x0, y0) = (self.x.floor(), self.y.floor());
        let (hsub, vsub) = ((self.x - x0) as f32, (self.y - y0) as f32);
        let (x0, y0) = (x0 as i32, y0 as i32);
        let taps = [
            (0, 0, (1.0 - hsub) * (1.0 - vsub)),
            (1, 0, hsub * (1.0 - vsub)),
            (0, 1, (1.0 - hsub) * vsub),
            (1, 1, hsub * vsub),
        ];

        let mut color = [0.0f32; 3];
        let mut alpha = 0.0f32;
        for (dx, dy, weight) in taps {
            if weight <= 0.0 {
                continue;
            }
            self.accessor.move_to(x0.saturating_add(dx), y0.saturating_add(dy));
            let pixel = if old {
                self.accessor.old_raw_data()
            } else {
                self.accessor.raw_data_const()
            };
            let rgba = self.encoding.to_rgba_f32(pixel);
            let coverage = weight * rgba[3];
            for (sum, channel) in color.iter_mut().zip(rgba) {
                *sum += coverage * channel;
            }
            alpha += coverage;
        }

        let rgba = if alpha > 0.0 {
            [color[0] / alpha, color[1] / alpha, color[2] / alpha, alpha]
        } else {
            [0.0; 4]
        };
        self.encoding.from_rgba_f32(rgba, dst);
        Ok(())
    }
}
