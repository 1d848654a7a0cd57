//! Helpers shared by the CLI, benches and integration tests: image loading,
//! per-stage statistics and directory scanning for batch runs.

pub mod synthetic;

use image::{GenericImageView, GrayImage};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions picked up by `dataset_iter` (compared lowercase)
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Longest-side limit from `OMR_MAX_DIM`; unset, zero or garbage means none
fn max_dim_from_env() -> Option<u32> {
    env::var("OMR_MAX_DIM").ok().as_deref().and_then(parse_max_dim)
}

fn parse_max_dim(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|&v| v > 0)
}

/// Load an image as RGB bytes along with its dimensions.
///
/// Images larger than `OMR_MAX_DIM` on their longest side are downscaled.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<(Vec<u8>, usize, usize), image::ImageError> {
    let img = image::open(path)?;
    let (width, height) = img.dimensions();
    let img = match max_dim_from_env() {
        Some(max_dim) if width.max(height) > max_dim => {
            img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok((rgb.into_raw(), width as usize, height as usize))
}

/// Luminance range of a grayscale buffer, as printed by `omrtool debug-detect`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrayStats {
    /// Darkest value (0 for an empty buffer)
    pub min: u8,
    /// Brightest value
    pub max: u8,
    /// Truncated mean
    pub avg: u8,
}

/// Share of set pixels in a binarized sheet
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaskStats {
    /// Non-zero pixels
    pub foreground_pixels: usize,
    /// All pixels
    pub total_pixels: usize,
    /// `foreground_pixels / total_pixels`, 0 for an empty mask
    pub foreground_ratio: f64,
}

/// Min, max and mean luminance
pub fn grayscale_stats(gray: &[u8]) -> GrayStats {
    let (Some(&min), Some(&max)) = (gray.iter().min(), gray.iter().max()) else {
        return GrayStats::default();
    };
    let sum: u64 = gray.iter().map(|&v| v as u64).sum();
    GrayStats {
        min,
        max,
        avg: (sum / gray.len() as u64) as u8,
    }
}

/// Foreground count of a mask (non-zero = foreground)
pub fn mask_stats(mask: &GrayImage) -> MaskStats {
    let foreground_pixels = mask.pixels().filter(|p| p[0] != 0).count();
    let total_pixels = mask.width() as usize * mask.height() as usize;
    MaskStats {
        foreground_pixels,
        total_pixels,
        foreground_ratio: if total_pixels == 0 {
            0.0
        } else {
            foreground_pixels as f64 / total_pixels as f64
        },
    }
}

/// Image paths under `root` (recursive), sorted, optionally truncated.
pub fn dataset_iter<P: AsRef<Path>>(root: P, limit: Option<usize>) -> impl Iterator<Item = PathBuf> {
    let mut images = collect_images(root.as_ref());
    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let is_image = path.extension().is_some_and(|ext| {
                IMAGE_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str())
            });
            if is_image {
                images.push(path);
            }
        }
    }

    images
}
