use image::RgbaImage;

use crate::error::PhotoPrepError;

/// Number of channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// An owned rectangular grid of RGBA samples, row-major.
///
/// Invariant: `data.len() == width * height * 4`, enforced at construction.
/// Every transform in this crate takes a buffer by reference and returns a
/// new owned buffer; no stage mutates its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zero-filled (transparent black) buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, PhotoPrepError> {
        if width == 0 || height == 0 {
            return Err(PhotoPrepError::ZeroDimensions);
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        })
    }

    /// Wrap raw RGBA bytes, validating the size invariant.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PhotoPrepError> {
        if width == 0 || height == 0 {
            return Err(PhotoPrepError::ZeroDimensions);
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(PhotoPrepError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert from an `image` crate RGBA buffer.
    pub fn from_image(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().clone(),
        }
    }

    /// Convert into an `image` crate RGBA buffer.
    pub fn into_image(self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data)
            .expect("PixelBuffer invariant guarantees the length")
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of the pixel at (x, y).
    #[inline]
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// The RGBA sample at (x, y). Panics when out of bounds.
    #[inline]
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Overwrite the RGBA sample at (x, y). Panics when out of bounds.
    #[inline]
    pub fn put_rgba(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Resize with bilinear interpolation. Pure resampling, no filtering.
    ///
    /// Sample positions use pixel-center mapping; source coordinates are
    /// clamped to the image, so edges replicate.
    pub fn resize_bilinear(&self, new_width: u32, new_height: u32) -> Result<Self, PhotoPrepError> {
        if new_width == 0 || new_height == 0 {
            return Err(PhotoPrepError::ZeroDimensions);
        }

        let mut out = Self::new(new_width, new_height)?;
        let x_ratio = self.width as f64 / new_width as f64;
        let y_ratio = self.height as f64 / new_height as f64;
        let max_x = self.width - 1;
        let max_y = self.height - 1;

        for y in 0..new_height {
            let sy = ((y as f64 + 0.5) * y_ratio - 0.5).clamp(0.0, max_y as f64);
            let y0 = sy.floor() as u32;
            let y1 = (y0 + 1).min(max_y);
            let fy = sy - y0 as f64;

            for x in 0..new_width {
                let sx = ((x as f64 + 0.5) * x_ratio - 0.5).clamp(0.0, max_x as f64);
                let x0 = sx.floor() as u32;
                let x1 = (x0 + 1).min(max_x);
                let fx = sx - x0 as f64;

                let p00 = self.rgba(x0, y0);
                let p10 = self.rgba(x1, y0);
                let p01 = self.rgba(x0, y1);
                let p11 = self.rgba(x1, y1);

                let mut sample = [0u8; 4];
                for c in 0..CHANNELS {
                    let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
                    let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
                    let v = top * (1.0 - fy) + bottom * fy;
                    sample[c] = v.round().clamp(0.0, 255.0) as u8;
                }
                out.put_rgba(x, y, sample);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                buf.put_rgba(
                    x,
                    y,
                    [
                        (x * 255 / width.max(1)) as u8,
                        (y * 255 / height.max(1)) as u8,
                        128,
                        255,
                    ],
                );
            }
        }
        buf
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(matches!(
            PixelBuffer::new(0, 10),
            Err(PhotoPrepError::ZeroDimensions)
        ));
        assert!(matches!(
            PixelBuffer::new(10, 0),
            Err(PhotoPrepError::ZeroDimensions)
        ));
    }

    #[test]
    fn from_raw_validates_length() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        match err {
            PhotoPrepError::BufferSizeMismatch { expected, actual } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 15);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn pixel_roundtrip() {
        let mut buf = PixelBuffer::new(3, 3).unwrap();
        buf.put_rgba(1, 2, [10, 20, 30, 40]);
        assert_eq!(buf.rgba(1, 2), [10, 20, 30, 40]);
        assert_eq!(buf.rgba(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn image_interop_roundtrip() {
        let buf = gradient(5, 4);
        let img = buf.clone().into_image();
        assert_eq!(PixelBuffer::from_image(&img), buf);
    }

    #[test]
    fn resize_to_same_dimensions_is_identity() {
        let buf = gradient(7, 5);
        let resized = buf.resize_bilinear(7, 5).unwrap();
        assert_eq!(resized, buf);
    }

    #[test]
    fn resize_changes_dimensions() {
        let buf = gradient(10, 10);
        let resized = buf.resize_bilinear(15, 23).unwrap();
        assert_eq!(resized.width(), 15);
        assert_eq!(resized.height(), 23);
    }

    #[test]
    fn resize_uniform_stays_uniform() {
        let mut buf = PixelBuffer::new(4, 4).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                buf.put_rgba(x, y, [90, 60, 30, 255]);
            }
        }
        let resized = buf.resize_bilinear(9, 9).unwrap();
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(resized.rgba(x, y), [90, 60, 30, 255]);
            }
        }
    }

    #[test]
    fn resize_rejects_zero_target() {
        let buf = gradient(4, 4);
        assert!(matches!(
            buf.resize_bilinear(0, 4),
            Err(PhotoPrepError::ZeroDimensions)
        ));
    }
}
