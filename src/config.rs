//! Analyzer configuration.
//!
//! Every field has a default; [`AnalyzerConfig::from_env`] overlays `OMR_*`
//! environment variables for quick tuning without recompiling.

use serde::Deserialize;

use crate::error::{AnalysisError, Result};

/// Tunables for one `analyze` call
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Smallest contour area accepted as a bubble (px²)
    pub min_bubble_area: f32,
    /// Largest contour area accepted as a bubble (px²)
    pub max_bubble_area: f32,
    /// Circularity floor for the primary extraction pass
    pub min_circularity: f32,
    /// Fill ratio at or above which a bubble counts as marked
    pub fill_threshold: f32,
    /// Options per question; rows with more bubbles are merged down to this
    pub expected_options: Option<usize>,
    /// Questions on the sheet. Informational, never enforced
    pub expected_questions: Option<usize>,
    /// Render an annotated overlay into the result
    pub debug_overlay: bool,
    /// Run tile-based contrast enhancement before smoothing
    pub contrast_enhancement: bool,
    /// Histogram clip limit for contrast enhancement
    pub clahe_clip_limit: f32,
    /// Tiles per axis for contrast enhancement
    pub clahe_tiles: usize,
    /// Adaptive threshold window is `2 * radius + 1` pixels square
    pub adaptive_block_radius: usize,
    /// Subtracted from the local mean before comparing
    pub adaptive_offset: i32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_bubble_area: 150.0,
            max_bubble_area: 20000.0,
            min_circularity: 0.35,
            fill_threshold: 0.35,
            expected_options: None,
            expected_questions: None,
            debug_overlay: false,
            contrast_enhancement: true,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            adaptive_block_radius: 12,
            adaptive_offset: 8,
        }
    }
}

impl AnalyzerConfig {
    /// Set the expected option count per row
    pub fn with_expected_options(mut self, options: usize) -> Self {
        self.expected_options = Some(options);
        self
    }

    /// Set the expected question count
    pub fn with_expected_questions(mut self, questions: usize) -> Self {
        self.expected_questions = Some(questions);
        self
    }

    /// Set the fill threshold
    pub fn with_fill_threshold(mut self, threshold: f32) -> Self {
        self.fill_threshold = threshold;
        self
    }

    /// Enable or disable the debug overlay
    pub fn with_debug_overlay(mut self, enabled: bool) -> Self {
        self.debug_overlay = enabled;
        self
    }

    /// Defaults overlaid with `OMR_*` environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            min_bubble_area: parse_env_f32("OMR_MIN_AREA", d.min_bubble_area),
            max_bubble_area: parse_env_f32("OMR_MAX_AREA", d.max_bubble_area),
            min_circularity: parse_env_f32("OMR_MIN_CIRCULARITY", d.min_circularity),
            fill_threshold: parse_env_f32("OMR_FILL_THRESHOLD", d.fill_threshold),
            expected_options: parse_env_opt_usize("OMR_EXPECTED_OPTIONS"),
            expected_questions: parse_env_opt_usize("OMR_EXPECTED_QUESTIONS"),
            debug_overlay: parse_env_bool_u8("OMR_DEBUG_OVERLAY", d.debug_overlay),
            contrast_enhancement: parse_env_bool_u8("OMR_CONTRAST", d.contrast_enhancement),
            ..d
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.min_bubble_area.is_finite() || self.min_bubble_area < 0.0 {
            return Err(AnalysisError::config("min_bubble_area must be a non-negative number"));
        }
        if !self.max_bubble_area.is_finite() || self.max_bubble_area < self.min_bubble_area {
            return Err(AnalysisError::config(format!(
                "max_bubble_area ({}) must be >= min_bubble_area ({})",
                self.max_bubble_area, self.min_bubble_area
            )));
        }
        if !(0.0..=1.0).contains(&self.min_circularity) {
            return Err(AnalysisError::config("min_circularity must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.fill_threshold) {
            return Err(AnalysisError::config("fill_threshold must be within [0, 1]"));
        }
        if self.expected_options == Some(0) {
            return Err(AnalysisError::config("expected_options must be at least 1"));
        }
        if self.clahe_tiles == 0 {
            return Err(AnalysisError::config("clahe_tiles must be at least 1"));
        }
        if !self.clahe_clip_limit.is_finite() || self.clahe_clip_limit <= 0.0 {
            return Err(AnalysisError::config("clahe_clip_limit must be positive"));
        }
        if self.adaptive_block_radius == 0 {
            return Err(AnalysisError::config("adaptive_block_radius must be at least 1"));
        }
        Ok(())
    }
}

fn parse_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn parse_env_opt_usize(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}
