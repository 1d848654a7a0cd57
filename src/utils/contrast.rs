//! Tile-based contrast enhancement (contrast-limited adaptive histogram
//! equalization).
//!
//! The image is split into a `tiles x tiles` grid. Each tile gets its own
//! clipped-histogram equalization lookup table and every output pixel blends
//! the four nearest tile tables bilinearly, so tile seams do not show.

use rayon::prelude::*;

/// Contrast enhancement could not run on this input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContrastError {
    /// Fewer than two pixels per tile along an axis.
    #[error("image {width}x{height} too small for a {tiles}x{tiles} tile grid")]
    TooSmall {
        /// Image width (px)
        width: usize,
        /// Image height (px)
        height: usize,
        /// Tiles per axis
        tiles: usize,
    },

    /// Clip limit is zero, negative or not a number.
    #[error("invalid clip limit: {0}")]
    ClipLimit(f32),
}

/// Equalize `gray` tile by tile, returning a new buffer
pub fn equalize_tiles(
    gray: &[u8],
    width: usize,
    height: usize,
    clip_limit: f32,
    tiles: usize,
) -> Result<Vec<u8>, ContrastError> {
    if !clip_limit.is_finite() || clip_limit <= 0.0 {
        return Err(ContrastError::ClipLimit(clip_limit));
    }
    if tiles == 0 || width < tiles * 2 || height < tiles * 2 {
        return Err(ContrastError::TooSmall {
            width,
            height,
            tiles,
        });
    }

    let luts: Vec<[u8; 256]> = (0..tiles * tiles)
        .into_par_iter()
        .map(|t| {
            let (tx, ty) = (t % tiles, t / tiles);
            let x0 = tx * width / tiles;
            let x1 = (tx + 1) * width / tiles;
            let y0 = ty * height / tiles;
            let y1 = (ty + 1) * height / tiles;
            tile_lut(gray, width, x0, x1, y0, y1, clip_limit)
        })
        .collect();

    let tile_w = width as f32 / tiles as f32;
    let tile_h = height as f32 / tiles as f32;
    let last = tiles - 1;

    let mut out = vec![0u8; width * height];
    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let (ty0, ty1, wy) = blend_position(y, tile_h, last);
        for (x, dst) in row.iter_mut().enumerate() {
            let (tx0, tx1, wx) = blend_position(x, tile_w, last);
            let v = gray[y * width + x] as usize;

            let top = luts[ty0 * tiles + tx0][v] as f32 * (1.0 - wx)
                + luts[ty0 * tiles + tx1][v] as f32 * wx;
            let bottom = luts[ty1 * tiles + tx0][v] as f32 * (1.0 - wx)
                + luts[ty1 * tiles + tx1][v] as f32 * wx;
            *dst = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
        }
    });

    Ok(out)
}

/// Neighbouring tile indices and the weight of the second one
#[inline]
fn blend_position(p: usize, tile_size: f32, last: usize) -> (usize, usize, f32) {
    let g = (p as f32 + 0.5) / tile_size - 0.5;
    let t0 = (g.floor().max(0.0) as usize).min(last);
    let t1 = (t0 + 1).min(last);
    let w = if t1 == t0 { 0.0 } else { (g - t0 as f32).clamp(0.0, 1.0) };
    (t0, t1, w)
}

fn tile_lut(
    gray: &[u8],
    width: usize,
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
    clip_limit: f32,
) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for &pixel in &gray[y * width + x0..y * width + x1] {
            histogram[pixel as usize] += 1;
        }
    }

    let area = ((x1 - x0) * (y1 - y0)) as u32;
    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    // Spread clipped mass evenly, remainder to the lowest bins.
    let per_bin = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, count) in histogram.iter_mut().enumerate() {
        *count += per_bin + u32::from(i < remainder);
    }

    let mut lut = [0u8; 256];
    let scale = 255.0 / area as f32;
    let mut cdf = 0u32;
    for (i, &count) in histogram.iter().enumerate() {
        cdf += count;
        lut[i] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}
