//! RustOMR - bubble-sheet answer extraction for bulk exam grading
//!
//! Turns a photographed or scanned answer sheet into the selected option per
//! question. The pipeline normalizes the image, finds bubble-shaped regions,
//! measures how much of each bubble is inked, groups bubbles into question
//! rows and picks the marked option per row.
//!
//! ```
//! use rust_omr::{AnalyzerConfig, RasterImage, analyze};
//! use rust_omr::tools::synthetic::{SheetLayout, render_answers};
//!
//! let layout = SheetLayout::grid(3, 4);
//! let sheet = render_answers(&layout, &[Some(0), Some(2), Some(3)]);
//! let raster = RasterImage::from_rgb_image(&sheet).unwrap();
//!
//! let config = AnalyzerConfig::default().with_expected_options(4);
//! let result = analyze(&raster, &config).unwrap();
//! let picks: Vec<_> = result.questions.iter().map(|q| q.selected_option).collect();
//! assert_eq!(picks, vec![Some(0), Some(2), Some(3)]);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Analyzer configuration
pub mod config;
/// Bubble detection stages (normalize, candidates, fill, rows, select)
pub mod detector;
/// Error types
pub mod error;
/// Scoring against an answer key
pub mod grading;
/// Core data structures (RasterImage, bubbles, rows, results)
pub mod models;
/// Debug overlay rendering
pub mod overlay;
/// Image loading, statistics and synthetic sheets
pub mod tools;
/// Utility functions (grayscale, contrast, thresholding, geometry)
pub mod utils;

mod pipeline;

pub use config::AnalyzerConfig;
pub use error::AnalysisError;
pub use models::{
    AnalysisResult, BubbleCandidate, ClassifiedBubble, Diagnostics, PixelLayout, QuestionResult,
    RasterImage,
};
pub use pipeline::MIN_VIABLE_CANDIDATES;

/// Extract answers from one sheet image
///
/// # Arguments
/// * `image` - Borrowed pixel buffer with its dimensions and layout
/// * `config` - Detection tunables; see [`AnalyzerConfig`]
///
/// # Returns
/// Questions top to bottom, every classified bubble, and diagnostics. Sheets
/// where few bubbles were found still succeed, with `diagnostics.degraded`
/// set; only unusable input or configuration is an error.
pub fn analyze(image: &RasterImage<'_>, config: &AnalyzerConfig) -> Result<AnalysisResult, AnalysisError> {
    pipeline::run(image, config)
}

/// Analyze an RGB buffer
///
/// # Arguments
/// * `image` - Raw RGB bytes (3 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn analyze_rgb(
    image: &[u8],
    width: usize,
    height: usize,
    config: &AnalyzerConfig,
) -> Result<AnalysisResult, AnalysisError> {
    analyze(&RasterImage::from_rgb(image, width, height)?, config)
}

/// Reusable analyzer holding a validated configuration.
///
/// Holds no per-image state, so one instance can serve many threads.
#[derive(Debug, Clone)]
pub struct SheetAnalyzer {
    config: AnalyzerConfig,
}

impl SheetAnalyzer {
    /// Create an analyzer, validating the configuration up front
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Analyzer configured from `OMR_*` environment variables
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::new(AnalyzerConfig::from_env())
    }

    /// The configuration in use
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one image
    pub fn analyze(&self, image: &RasterImage<'_>) -> Result<AnalysisResult, AnalysisError> {
        analyze(image, &self.config)
    }

    /// Analyze several images in parallel; results keep input order and one
    /// failure does not affect the others
    pub fn analyze_batch(
        &self,
        images: &[RasterImage<'_>],
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        use rayon::prelude::*;
        images.par_iter().map(|image| self.analyze(image)).collect()
    }
}

impl Default for SheetAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }
}
