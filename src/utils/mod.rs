//! Pixel-level primitives for sheet analysis
//!
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Tile-based contrast enhancement
//! - Binarization (locally adaptive and Otsu)
//! - Geometry (contour area, circularity, hull, minimal enclosing circle)

pub mod binarization;
pub mod contrast;
pub mod geometry;
pub mod grayscale;
