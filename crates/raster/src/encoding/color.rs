use std::fmt;

use super::{ConversionFlags, EncodingRef, RenderingIntent, same_encoding};

/// Pixel bytes tagged with the encoding they are expressed in
#[derive(Clone)]
pub struct Color {
    encoding: EncodingRef,
    data: Vec<u8>,
}

impl Color {
    /// Wrap raw bytes. Returns `None` if the length does not match the pixel size.
    pub fn new(encoding: EncodingRef, data: Vec<u8>) -> Option<Self> {
        if data.len() != encoding.pixel_size() {
            return None;
        }
        Some(Self { encoding, data })
    }

    pub fn from_rgba8(rgba: [u8; 4], encoding: EncodingRef) -> Self {
        Self::from_rgba_f32(rgba.map(|c| c as f32 / 255.0), encoding)
    }

    pub fn from_rgba_f32(rgba: [f32; 4], encoding: EncodingRef) -> Self {
        let mut data = vec![0; encoding.pixel_size()];
        encoding.from_rgba_f32(rgba, &mut data);
        Self { encoding, data }
    }

    pub fn transparent(encoding: EncodingRef) -> Self {
        let data = encoding.transparent_pixel();
        Self { encoding, data }
    }

    pub fn white(encoding: EncodingRef) -> Self {
        Self::from_rgba_f32([1.0; 4], encoding)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn encoding(&self) -> &EncodingRef {
        &self.encoding
    }

    pub fn opacity_u8(&self) -> u8 {
        self.encoding.opacity_u8(&self.data)
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        self.encoding
            .to_rgba_f32(&self.data)
            .map(super::unit_to_u8)
    }

    /// Same color expressed in another encoding
    pub fn converted_to(&self, encoding: &EncodingRef) -> Color {
        if same_encoding(self.encoding.as_ref(), encoding.as_ref()) {
            return self.clone();
        }
        let mut data = vec![0; encoding.pixel_size()];
        self.encoding.convert_pixels_to(
            &self.data,
            &mut data,
            encoding.as_ref(),
            1,
            RenderingIntent::default(),
            ConversionFlags::default(),
        );
        Color {
            encoding: encoding.clone(),
            data,
        }
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        same_encoding(self.encoding.as_ref(), other.encoding.as_ref()) && self.data == other.data
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Color")
            .field("encoding", &self.encoding.id())
            .field("data", &self.data)
            .finish()
    }
}
