//! Bubble candidate extraction from the binary mask.
//!
//! External contours are scored by area and circularity. When the primary
//! pass yields too few candidates, exactly one relaxed pass runs over the same
//! contours with widened bounds; its hits are kept only if they do not
//! duplicate an already accepted candidate.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::arc_length;
use imageproc::point::Point as PixelPoint;
use log::{debug, trace};

use crate::models::{BubbleCandidate, Point};
use crate::utils::geometry::{circularity, hull_points, min_enclosing_circle, polygon_area};

/// Fewer primary candidates than this triggers the relaxed pass
pub const RETRY_TRIGGER: usize = 10;
/// Relaxed lower area bound, as a factor of `min_area`
pub const RELAXED_MIN_AREA_FACTOR: f32 = 0.6;
/// Relaxed upper area bound, as a factor of `max_area`
pub const RELAXED_MAX_AREA_FACTOR: f32 = 2.0;
/// Circularity floor for the relaxed pass
pub const RELAXED_MIN_CIRCULARITY: f32 = 0.28;
/// Relaxed hits closer than this to an accepted candidate are duplicates (px)
pub const DEDUP_MIN_DISTANCE: f32 = 5.0;
/// Duplicate distance as a factor of the relaxed hit's radius
pub const DEDUP_RADIUS_FACTOR: f32 = 0.6;

/// Acceptance bounds for one extraction pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionParams {
    /// Minimum contour area (px²)
    pub min_area: f32,
    /// Maximum contour area (px²)
    pub max_area: f32,
    /// Minimum `4π·area / perimeter²`
    pub min_circularity: f32,
}

impl ExtractionParams {
    /// Bounds used by the single relaxed retry
    pub fn relaxed(&self) -> Self {
        Self {
            min_area: self.min_area * RELAXED_MIN_AREA_FACTOR,
            max_area: self.max_area * RELAXED_MAX_AREA_FACTOR,
            min_circularity: self.min_circularity.min(RELAXED_MIN_CIRCULARITY),
        }
    }

    fn accepts(&self, region: &Region) -> bool {
        region.area >= self.min_area
            && region.area <= self.max_area
            && region.circularity >= self.min_circularity
    }
}

/// Candidates plus retry bookkeeping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Accepted candidates, primary hits first
    pub candidates: Vec<BubbleCandidate>,
    /// Accepted by the primary pass
    pub primary: usize,
    /// Added by the relaxed pass
    pub relaxed: usize,
    /// Whether the relaxed pass ran
    pub retried: bool,
}

/// One external contour with its shape measurements
struct Region {
    hull: Vec<Point>,
    area: f32,
    circularity: f32,
}

impl Region {
    fn from_points(points: &[PixelPoint<i32>]) -> Self {
        let area = polygon_area(points);
        let perimeter = arc_length(points, true) as f32;
        Self {
            hull: hull_points(points),
            area,
            circularity: circularity(area, perimeter),
        }
    }

    fn candidate(&self) -> Option<BubbleCandidate> {
        let (center, radius) = min_enclosing_circle(&self.hull)?;
        Some(BubbleCandidate::new(center.x, center.y, radius))
    }
}

/// Outer borders that are not nested inside another region
fn external_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Region::from_points(&c.points))
        .collect()
}

/// Find bubble-shaped regions in `mask` (foreground = non-zero)
pub fn extract_candidates(mask: &GrayImage, params: &ExtractionParams) -> Extraction {
    let regions = external_regions(mask);

    let mut candidates: Vec<BubbleCandidate> = Vec::new();
    for region in &regions {
        if !params.accepts(region) {
            trace!(
                "rejected region: area={:.1} circularity={:.3}",
                region.area, region.circularity
            );
            continue;
        }
        if let Some(candidate) = region.candidate() {
            candidates.push(candidate);
        }
    }

    let primary = candidates.len();
    let mut extraction = Extraction {
        primary,
        ..Extraction::default()
    };

    if primary < RETRY_TRIGGER {
        extraction.retried = true;
        let relaxed = params.relaxed();
        for region in regions.iter().filter(|r| relaxed.accepts(r)) {
            let Some(candidate) = region.candidate() else {
                continue;
            };
            if is_duplicate(&candidate, &candidates) {
                continue;
            }
            candidates.push(candidate);
        }
        extraction.relaxed = candidates.len() - primary;
    }

    debug!(
        "candidates: {} external regions, {} primary, {} relaxed (retried: {})",
        regions.len(),
        extraction.primary,
        extraction.relaxed,
        extraction.retried
    );

    extraction.candidates = candidates;
    extraction
}

fn is_duplicate(candidate: &BubbleCandidate, accepted: &[BubbleCandidate]) -> bool {
    let min_distance = DEDUP_MIN_DISTANCE.max(candidate.radius * DEDUP_RADIUS_FACTOR);
    let center = candidate.center();
    accepted
        .iter()
        .any(|a| a.center().distance(&center) <= min_distance)
}
