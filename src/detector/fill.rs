/// Fill classification: each candidate is thresholded against the paper
/// right around it, so uneven lighting across the sheet does not bias the
/// result
use image::GrayImage;
use rayon::prelude::*;

use crate::models::{BubbleCandidate, ClassifiedBubble};
use crate::utils::binarization::otsu_threshold;

/// Inner disc radius as a fraction of the bubble radius
pub const INNER_RADIUS_FACTOR: f32 = 0.8;
/// Inner edge of the paper ring around a bubble, as a fraction of its radius
pub const PAPER_RING_INNER: f32 = 1.25;
/// Outer edge of the paper ring
pub const PAPER_RING_OUTER: f32 = 1.6;
/// Otsu classes closer than this (gray levels) mean there is no mark. Dark
/// pixels must also sit this far below the paper ring's median.
pub const MIN_LOCAL_CONTRAST: u8 = 24;

/// Classify every candidate independently, preserving input order
pub fn classify_candidates(
    candidates: &[BubbleCandidate],
    smoothed: &GrayImage,
    fill_threshold: f32,
) -> Vec<ClassifiedBubble> {
    candidates
        .par_iter()
        .map(|&candidate| {
            ClassifiedBubble::new(candidate, fill_ratio(&candidate, smoothed), fill_threshold)
        })
        .collect()
}

/// Fraction of the candidate's inner disc that is dark, in `[0, 1]`.
///
/// The dark level is an Otsu split over the inner disc together with a
/// ring of surrounding paper, capped below the ring's median. A disc as dark
/// as its surroundings, lit or shadowed, reads as empty.
pub fn fill_ratio(candidate: &BubbleCandidate, smoothed: &GrayImage) -> f32 {
    let inner = candidate.radius * INNER_RADIUS_FACTOR;
    let disc = histogram_between(smoothed, candidate, 0.0, inner);
    let total: u32 = disc.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let ring = histogram_between(
        smoothed,
        candidate,
        candidate.radius * PAPER_RING_INNER,
        candidate.radius * PAPER_RING_OUTER,
    );
    let mut combined = ring;
    for (c, d) in combined.iter_mut().zip(disc.iter()) {
        *c += d;
    }

    let Some(mut threshold) = local_threshold(&combined) else {
        return 0.0;
    };
    if let Some(paper) = median(&ring) {
        let Some(cap) = paper.checked_sub(MIN_LOCAL_CONTRAST) else {
            return 0.0;
        };
        threshold = threshold.min(cap);
    }
    let dark: u32 = disc[..=threshold as usize].iter().sum();
    dark as f32 / total as f32
}

/// Histogram of pixels whose center lies in `inner < d <= outer` from the
/// candidate center (`d <= outer` when `inner` is zero), clipped to the image
fn histogram_between(
    image: &GrayImage,
    candidate: &BubbleCandidate,
    inner: f32,
    outer: f32,
) -> [u32; 256] {
    let mut histogram = [0u32; 256];
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || outer <= 0.0 {
        return histogram;
    }

    let (inner2, outer2) = (inner * inner, outer * outer);
    let x0 = (candidate.x - outer).floor().max(0.0) as u32;
    let y0 = (candidate.y - outer).floor().max(0.0) as u32;
    let x1 = ((candidate.x + outer).ceil().max(0.0) as u32).min(width - 1);
    let y1 = ((candidate.y + outer).ceil().max(0.0) as u32).min(height - 1);
    for y in y0..=y1 {
        let dy = y as f32 - candidate.y;
        for x in x0..=x1 {
            let dx = x as f32 - candidate.x;
            let d2 = dx * dx + dy * dy;
            if d2 <= outer2 && (inner <= 0.0 || d2 > inner2) {
                histogram[image.get_pixel(x, y)[0] as usize] += 1;
            }
        }
    }
    histogram
}

fn median(histogram: &[u32; 256]) -> Option<u8> {
    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return None;
    }
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count as u64;
        if seen * 2 >= total {
            return Some(value as u8);
        }
    }
    None
}

/// Otsu level, or `None` when the two classes are too close to be ink and
/// paper
fn local_threshold(histogram: &[u32; 256]) -> Option<u8> {
    let t = otsu_threshold(histogram)?;

    let (mut n1, mut s1, mut n2, mut s2) = (0u64, 0f64, 0u64, 0f64);
    for (value, &count) in histogram.iter().enumerate() {
        if value <= t as usize {
            n1 += count as u64;
            s1 += value as f64 * count as f64;
        } else {
            n2 += count as u64;
            s2 += value as f64 * count as f64;
        }
    }
    if n1 == 0 || n2 == 0 {
        return None;
    }
    let separation = (s2 / n2 as f64) - (s1 / n1 as f64);
    (separation >= MIN_LOCAL_CONTRAST as f64).then_some(t)
}
