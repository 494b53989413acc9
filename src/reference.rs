use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{EvolveError, Result};

/// immutable straight-RGBA target buffer (row-major, width * height * 4)
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl ReferenceImage {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EvolveError::InvalidConfiguration(format!(
                "reference image must have a non-zero area, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(EvolveError::InvalidConfiguration(format!(
                "reference buffer holds {} bytes, {}x{} RGBA needs {}",
                rgba.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, rgba })
    }

    /// single-color image, mostly useful for tests and synthetic targets
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        Self::new(rgba.repeat(width as usize * height as usize), width, height)
    }

    pub fn from_image(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height)
    }

    /// decode any format the `image` crate was built with
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        profiling::scope!("ReferenceImage::open");
        let img = image::open(path.as_ref())?;
        Self::from_image(img.to_rgba8())
    }

    /// resample to a working resolution. the same size returns a plain copy
    pub fn resized(&self, width: u32, height: u32) -> Result<Self> {
        profiling::scope!("ReferenceImage::resized");
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        if width == 0 || height == 0 {
            return Err(EvolveError::InvalidConfiguration(format!(
                "compute resolution must have a non-zero area, got {}x{}",
                width, height
            )));
        }
        let src = RgbaImage::from_raw(self.width, self.height, self.rgba.clone()).ok_or_else(|| {
            EvolveError::InvalidConfiguration("reference buffer does not match its dimensions".to_owned())
        })?;
        let scaled = imageops::resize(&src, width, height, FilterType::Triangle);
        Self::from_image(scaled)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_area_and_bad_length() {
        assert!(ReferenceImage::new(Vec::new(), 0, 4).is_err());
        assert!(ReferenceImage::new(vec![0; 15], 2, 2).is_err());
        assert!(ReferenceImage::new(vec![0; 16], 2, 2).is_ok());
    }

    #[test]
    fn test_resized_dimensions_and_color() {
        let img = ReferenceImage::filled(40, 20, [200, 100, 50, 255]).unwrap();
        let small = img.resized(10, 5).unwrap();
        assert_eq!((small.width(), small.height()), (10, 5));
        assert_eq!(small.pixels().len(), 10 * 5 * 4);
        // resampling a flat color keeps the color
        assert!(small.pixels().chunks(4).all(|p| p == [200, 100, 50, 255]));
    }

    #[test]
    fn test_resized_same_size_is_identity() {
        let img = ReferenceImage::filled(3, 3, [1, 2, 3, 4]).unwrap();
        assert_eq!(img.resized(3, 3).unwrap(), img);
        assert!(img.resized(0, 3).is_err());
    }
}
