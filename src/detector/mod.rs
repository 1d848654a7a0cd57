//! Bubble detection stages
//!
//! Each stage consumes only the previous stage's output:
//! - Normalization (grayscale, contrast, smoothing, binarization, closing)
//! - Candidate extraction (contour shape filtering with one relaxed retry)
//! - Fill classification (per-candidate local Otsu)
//! - Row clustering (single-pass vertical grouping)
//! - Answer selection (ordering, optional merge, thresholded argmax)

/// Contour-based candidate extraction
pub mod candidates;
/// Per-bubble fill measurement
pub mod fill;
/// Image normalization
pub mod normalize;
/// Row grouping
pub mod rows;
/// Per-row answer selection
pub mod select;
