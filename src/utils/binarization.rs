/// Thresholding primitives: locally adaptive (mean - offset) and Otsu
use rayon::prelude::*;

/// Foreground value in binary masks
pub const FOREGROUND: u8 = 255;
/// Background value in binary masks
pub const BACKGROUND: u8 = 0;

/// Inverted adaptive binarization: a pixel becomes foreground (255) when it is
/// at least `offset` levels darker than the mean of its `(2r+1)²` window.
/// Windows are clipped at the image border.
pub fn adaptive_binarize_inv(
    gray: &[u8],
    width: usize,
    height: usize,
    radius: usize,
    offset: i32,
) -> Vec<u8> {
    let mut out = vec![BACKGROUND; width * height];
    if width == 0 || height == 0 {
        return out;
    }

    let integral = integral_image(gray, width, height);
    let stride = width + 1;

    out.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height);
        for (x, dst) in row.iter_mut().enumerate() {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(width);

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((x1 - x0) * (y1 - y0)) as f64;
            let threshold = sum as f64 / count - offset as f64;

            if gray[y * width + x] as f64 <= threshold {
                *dst = FOREGROUND;
            }
        }
    });

    out
}

/// Summed-area table with a zero first row and column
fn integral_image(gray: &[u8], width: usize, height: usize) -> Vec<u64> {
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += gray[y * width + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    integral
}

/// Otsu's threshold for a 256-bin histogram.
///
/// Returns `t` such that values `<= t` form the dark class, or `None` when the
/// histogram does not contain two non-empty classes.
pub fn otsu_threshold(histogram: &[u32; 256]) -> Option<u8> {
    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return None;
    }
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best: Option<(u8, f64)> = None;
    let mut class1_pixels = 0u64;
    let mut class1_sum = 0f64;

    for t in 0..255usize {
        class1_pixels += histogram[t] as u64;
        class1_sum += t as f64 * histogram[t] as f64;

        let class2_pixels = total - class1_pixels;
        if class1_pixels == 0 || class2_pixels == 0 {
            continue;
        }

        let class1_mean = class1_sum / class1_pixels as f64;
        let class2_mean = (total_sum - class1_sum) / class2_pixels as f64;

        let weight1 = class1_pixels as f64 / total as f64;
        let weight2 = class2_pixels as f64 / total as f64;

        let variance = weight1 * weight2 * (class1_mean - class2_mean).powi(2);

        // Strict comparison keeps the lowest threshold on ties.
        if best.is_none_or(|(_, v)| variance > v) {
            best = Some((t as u8, variance));
        }
    }

    best.map(|(t, _)| t)
}
