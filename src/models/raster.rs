use crate::error::{AnalysisError, Result};

/// Channel layout of a raw pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 1 byte per pixel luminance
    Gray,
    /// 3 bytes per pixel, R G B
    Rgb,
    /// 4 bytes per pixel, R G B A (alpha ignored)
    Rgba,
}

impl PixelLayout {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// Borrowed view of a caller-owned image. Never modified by the analyzer.
#[derive(Debug, Clone, Copy)]
pub struct RasterImage<'a> {
    pixels: &'a [u8],
    width: usize,
    height: usize,
    layout: PixelLayout,
}

impl<'a> RasterImage<'a> {
    /// Wrap a raw buffer, validating its size against the dimensions
    pub fn new(pixels: &'a [u8], width: usize, height: usize, layout: PixelLayout) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyImage { width, height });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(layout.channels()))
            .ok_or(AnalysisError::TooLarge { width, height })?;
        if pixels.len() != expected {
            return Err(AnalysisError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            layout,
        })
    }

    /// Wrap an RGB buffer (3 bytes per pixel)
    pub fn from_rgb(pixels: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(pixels, width, height, PixelLayout::Rgb)
    }

    /// Wrap an RGBA buffer (4 bytes per pixel)
    pub fn from_rgba(pixels: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(pixels, width, height, PixelLayout::Rgba)
    }

    /// Wrap a grayscale buffer (1 byte per pixel)
    pub fn from_gray(pixels: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::new(pixels, width, height, PixelLayout::Gray)
    }

    /// Borrow an `image` crate RGB buffer
    pub fn from_rgb_image(image: &'a image::RgbImage) -> Result<Self> {
        Self::from_rgb(image.as_raw(), image.width() as usize, image.height() as usize)
    }

    /// Borrow an `image` crate grayscale buffer
    pub fn from_gray_image(image: &'a image::GrayImage) -> Result<Self> {
        Self::from_gray(image.as_raw(), image.width() as usize, image.height() as usize)
    }

    /// Raw pixel bytes
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Channel layout
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }
}
