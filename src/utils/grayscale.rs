/// Convert raster images to 8-bit luminance
/// Y = 0.299*R + 0.587*G + 0.114*B
/// Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use rayon::prelude::*;

use crate::models::{PixelLayout, RasterImage};

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: i32 = 76;
const COEF_G: i32 = 150;
const COEF_B: i32 = 29;

/// Convert any supported layout to a fresh grayscale buffer
pub fn to_grayscale(raster: &RasterImage<'_>) -> Vec<u8> {
    let (width, height) = (raster.width(), raster.height());
    match raster.layout() {
        PixelLayout::Gray => raster.pixels().to_vec(),
        PixelLayout::Rgb => interleaved_to_grayscale(raster.pixels(), width, height, 3),
        PixelLayout::Rgba => interleaved_to_grayscale(raster.pixels(), width, height, 4),
    }
}

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as i32 + COEF_G * g as i32 + COEF_B * b as i32) >> 8;
    lum.min(255) as u8
}

// Rows are converted in parallel; each row writes only its own slice.
fn interleaved_to_grayscale(src: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 {
        return gray;
    }

    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let row_start = y * width * channels;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * channels;
            *out = luminance(src[idx], src[idx + 1], src[idx + 2]);
        }
    });

    gray
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
        to_grayscale(&RasterImage::from_rgb(pixels, width, height).unwrap())
    }

    #[test]
    fn test_rgb_to_grayscale() {
        // Pure white
        assert!(rgb(&[255, 255, 255], 1, 1)[0] >= 254);

        // Pure black
        assert_eq!(rgb(&[0, 0, 0], 1, 1)[0], 0);

        // Pure red
        let red = rgb(&[255, 0, 0], 1, 1);
        assert!(red[0] < 255);
        assert!(red[0] > 0);

        // 2x2 image
        let img = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        assert_eq!(rgb(&img, 2, 2).len(), 4);
    }

    #[test]
    fn test_rgba_ignores_alpha() {
        let opaque = RasterImage::from_rgba(&[255, 128, 64, 255], 1, 1).unwrap();
        let clear = RasterImage::from_rgba(&[255, 128, 64, 0], 1, 1).unwrap();
        assert_eq!(to_grayscale(&opaque), to_grayscale(&clear));
        assert_eq!(to_grayscale(&opaque), rgb(&[255, 128, 64], 1, 1));
    }

    #[test]
    fn test_gray_layout_is_copied() {
        let pixels = vec![10u8, 20, 30, 40];
        let raster = RasterImage::from_gray(&pixels, 2, 2).unwrap();
        assert_eq!(to_grayscale(&raster), pixels);
    }
}
