use log::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::detector::candidates::{ExtractionParams, RETRY_TRIGGER, extract_candidates};
use crate::detector::fill::classify_candidates;
use crate::detector::normalize::normalize;
use crate::detector::rows::{cluster_rows, sort_reading_order};
use crate::detector::select::select_answers;
use crate::error::Result;
use crate::models::{AnalysisResult, Diagnostics, RasterImage, Row};
use crate::overlay::render_overlay;

/// Fewer candidates than this after extraction marks the result degraded
pub const MIN_VIABLE_CANDIDATES: usize = RETRY_TRIGGER;

/// Run all stages on one image. Every intermediate buffer is dropped before
/// returning.
pub(crate) fn run(raster: &RasterImage<'_>, config: &AnalyzerConfig) -> Result<AnalysisResult> {
    config.validate()?;

    let normalized = normalize(raster, config)?;

    let params = ExtractionParams {
        min_area: config.min_bubble_area,
        max_area: config.max_bubble_area,
        min_circularity: config.min_circularity,
    };
    let extraction = extract_candidates(&normalized.binary, &params);

    let mut bubbles =
        classify_candidates(&extraction.candidates, &normalized.smoothed, config.fill_threshold);
    sort_reading_order(&mut bubbles);

    let rows = cluster_rows(&bubbles, raster.height());
    let questions = select_answers(&rows, config.expected_options, config.fill_threshold);

    let diagnostics = diagnose(
        extraction.primary,
        extraction.relaxed,
        extraction.retried,
        bubbles.len(),
        &rows,
        config,
    );

    if diagnostics.degraded {
        warn!(
            "degraded detection: {} candidates (minimum {})",
            bubbles.len(),
            MIN_VIABLE_CANDIDATES
        );
    }
    if diagnostics.question_count_matches == Some(false) {
        warn!(
            "found {} rows, expected {} questions",
            rows.len(),
            config.expected_questions.unwrap_or_default()
        );
    }
    debug!(
        "analysis: {} bubbles, {} rows, confidence {:.2}",
        bubbles.len(),
        rows.len(),
        diagnostics.confidence
    );

    let debug_overlay = config
        .debug_overlay
        .then(|| render_overlay(&normalized.smoothed, &bubbles));

    Ok(AnalysisResult {
        questions,
        bubbles,
        diagnostics,
        debug_overlay,
    })
}

fn diagnose(
    primary: usize,
    relaxed: usize,
    retried: bool,
    bubble_count: usize,
    rows: &[Row],
    config: &AnalyzerConfig,
) -> Diagnostics {
    let reference = config
        .expected_options
        .or_else(|| most_common_row_size(rows));
    let rows_matching_expected = match reference {
        Some(size) => rows.iter().filter(|r| r.len() == size).count(),
        None => 0,
    };
    let confidence = if rows.is_empty() {
        0.0
    } else {
        rows_matching_expected as f32 / rows.len() as f32
    };

    Diagnostics {
        primary_candidates: primary,
        relaxed_candidates: relaxed,
        retried,
        degraded: bubble_count < MIN_VIABLE_CANDIDATES,
        row_count: rows.len(),
        rows_matching_expected,
        confidence,
        question_count_matches: config.expected_questions.map(|q| q == rows.len()),
    }
}

/// Most frequent row length; ties go to the larger length
fn most_common_row_size(rows: &[Row]) -> Option<usize> {
    let max_len = rows.iter().map(Row::len).max()?;
    let mut counts = vec![0usize; max_len + 1];
    for row in rows {
        counts[row.len()] += 1;
    }
    counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &count)| count)
        .map(|(size, _)| size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BubbleCandidate, ClassifiedBubble};

    fn row_of(n: usize) -> Row {
        let b = |i: usize| {
            ClassifiedBubble::new(BubbleCandidate::new(i as f32 * 10.0, 0.0, 5.0), 0.0, 0.35)
        };
        let mut row = Row::start(b(0));
        for i in 1..n {
            row.push(b(i));
        }
        row
    }

    #[test]
    fn test_most_common_row_size() {
        let rows = vec![row_of(4), row_of(4), row_of(5)];
        assert_eq!(most_common_row_size(&rows), Some(4));
        assert_eq!(most_common_row_size(&[]), None);
        // Tie between 3 and 4 goes to 4
        assert_eq!(most_common_row_size(&[row_of(3), row_of(4)]), Some(4));
    }

    #[test]
    fn test_confidence_against_expected_options() {
        let rows = vec![row_of(4), row_of(4), row_of(5), row_of(3)];
        let config = AnalyzerConfig::default()
            .with_expected_options(4)
            .with_expected_questions(4);
        let d = diagnose(16, 0, false, 16, &rows, &config);
        assert_eq!(d.rows_matching_expected, 2);
        assert_eq!(d.confidence, 0.5);
        assert_eq!(d.question_count_matches, Some(true));
        assert!(!d.degraded);
    }

    #[test]
    fn test_no_rows_is_zero_confidence() {
        let d = diagnose(0, 0, true, 0, &[], &AnalyzerConfig::default());
        assert_eq!(d.confidence, 0.0);
        assert!(d.degraded);
        assert_eq!(d.question_count_matches, None);
    }
}
