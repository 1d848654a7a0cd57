use serde::Serialize;

use super::ClassifiedBubble;

/// Selected option for one question row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    /// 1-based top-to-bottom row position
    pub index: usize,
    /// 0-based option index, `None` when no option reached the fill threshold
    pub selected_option: Option<usize>,
    /// Fill score per option, left to right
    pub scores_per_option: Vec<f32>,
}

impl QuestionResult {
    /// Selected option as a letter (`A` for option 0)
    pub fn option_letter(&self) -> Option<char> {
        self.selected_option.and_then(option_letter)
    }
}

/// Letter for a 0-based option index (`0 -> 'A'`), `None` past `Z`
pub fn option_letter(option: usize) -> Option<char> {
    u8::try_from(option)
        .ok()
        .filter(|&o| o < 26)
        .map(|o| (b'A' + o) as char)
}

/// Confidence and retry bookkeeping for one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Candidates accepted by the primary extraction pass
    pub primary_candidates: usize,
    /// Candidates added by the relaxed pass
    pub relaxed_candidates: usize,
    /// Whether the relaxed pass ran
    pub retried: bool,
    /// Fewer than the minimum viable candidate count survived extraction
    pub degraded: bool,
    /// Number of rows found
    pub row_count: usize,
    /// Rows whose raw bubble count equals the expected (or most common) option count
    pub rows_matching_expected: usize,
    /// `rows_matching_expected / row_count`, 0 when there are no rows
    pub confidence: f32,
    /// Row count compared against `expected_questions`, when configured
    pub question_count_matches: Option<bool>,
}

/// Output of a single `analyze` call
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// One entry per row, top to bottom
    pub questions: Vec<QuestionResult>,
    /// Every classified bubble, sorted by (y, x)
    pub bubbles: Vec<ClassifiedBubble>,
    /// Confidence signal for routing to manual review
    pub diagnostics: Diagnostics,
    /// Annotated sheet, only when requested
    #[serde(skip)]
    pub debug_overlay: Option<image::RgbImage>,
}

impl AnalysisResult {
    /// True when the caller should send the sheet to manual review
    pub fn needs_review(&self) -> bool {
        self.diagnostics.degraded || self.diagnostics.confidence < 1.0
    }
}
