//! End-to-end tests on rendered answer sheets
//!
//! Every sheet is drawn by `tools::synthetic`, so the marked bubbles are
//! known exactly and the tests need no image fixtures on disk.

use image::RgbImage;
use rust_omr::grading::{AnswerKey, SubjectKey, score};
use rust_omr::tools::synthetic::{Mark, SheetLayout, render_answers, render_sheet};
use rust_omr::{AnalysisResult, AnalyzerConfig, RasterImage, SheetAnalyzer, analyze};

fn run(sheet: &RgbImage, config: &AnalyzerConfig) -> AnalysisResult {
    let raster = RasterImage::from_rgb_image(sheet).expect("valid raster");
    analyze(&raster, config).expect("analysis succeeds")
}

fn picks(result: &AnalysisResult) -> Vec<Option<usize>> {
    result
        .questions
        .iter()
        .map(|q| q.selected_option)
        .collect()
}

#[test]
fn test_one_mark_per_row_is_recovered() {
    let answers = vec![Some(0), Some(3), Some(1), Some(2), Some(0), Some(3)];
    let layout = SheetLayout::grid(answers.len(), 4);
    let sheet = render_answers(&layout, &answers);

    let result = run(&sheet, &AnalyzerConfig::default().with_expected_options(4));

    assert_eq!(picks(&result), answers);
    assert_eq!(result.bubbles.len(), 24);
    assert!(result.questions.iter().all(|q| q.scores_per_option.len() == 4));
    for (i, q) in result.questions.iter().enumerate() {
        assert_eq!(q.index, i + 1);
    }
    assert!(!result.diagnostics.degraded);
    assert!(!result.diagnostics.retried);
    assert_eq!(result.diagnostics.confidence, 1.0);
    assert!(!result.needs_review());
}

#[test]
fn test_filled_and_empty_scores_are_separated() {
    let layout = SheetLayout::grid(4, 5);
    let sheet = render_answers(&layout, &[Some(4), Some(2), Some(0), Some(1)]);
    let result = run(&sheet, &AnalyzerConfig::default());

    for bubble in &result.bubbles {
        if bubble.is_filled {
            assert!(bubble.fill_ratio > 0.8, "filled ratio {}", bubble.fill_ratio);
        } else {
            assert!(bubble.fill_ratio < 0.2, "empty ratio {}", bubble.fill_ratio);
        }
    }
    assert_eq!(result.bubbles.iter().filter(|b| b.is_filled).count(), 4);
}

#[test]
fn test_unmarked_row_has_no_selection() {
    let layout = SheetLayout::grid(4, 4);
    let sheet = render_answers(&layout, &[Some(1), None, Some(2), None]);
    let result = run(&sheet, &AnalyzerConfig::default());

    assert_eq!(picks(&result), vec![Some(1), None, Some(2), None]);
    assert!(
        result.questions[1]
            .scores_per_option
            .iter()
            .all(|&s| s < 0.35)
    );
}

#[test]
fn test_bubbles_are_in_reading_order() {
    let layout = SheetLayout::grid(3, 4);
    let sheet = render_answers(&layout, &[Some(0), Some(1), Some(2)]);
    let result = run(&sheet, &AnalyzerConfig::default());

    let row_of = |y: f32| ((y - layout.margin) / layout.spacing_y).round() as i32;
    assert!(result.bubbles.windows(2).all(|w| {
        let (a, b) = (&w[0], &w[1]);
        (row_of(a.y), a.x) <= (row_of(b.y), b.x)
    }));
}

#[test]
fn test_repeated_runs_are_identical() {
    let layout = SheetLayout::grid(5, 4);
    let sheet = render_answers(&layout, &[Some(2), Some(0), None, Some(3), Some(1)]);
    let config = AnalyzerConfig::default().with_expected_options(4);

    let first = serde_json::to_string(&run(&sheet, &config)).expect("serializable");
    let second = serde_json::to_string(&run(&sheet, &config)).expect("serializable");
    assert_eq!(first, second);
}

#[test]
fn test_raising_threshold_only_removes_selections() {
    let layout = SheetLayout::grid(3, 4);
    let marks = vec![
        vec![Mark::Empty, Mark::Half, Mark::Empty, Mark::Empty],
        vec![Mark::Filled, Mark::Empty, Mark::Empty, Mark::Empty],
        vec![Mark::Empty, Mark::Empty, Mark::Empty, Mark::Empty],
    ];
    let sheet = render_sheet(&layout, &marks);

    let base = run(&sheet, &AnalyzerConfig::default());
    assert_eq!(picks(&base), vec![Some(1), Some(0), None]);
    let half_ratio = base.questions[0].scores_per_option[1];
    assert!(half_ratio > 0.35 && half_ratio < 0.8, "half ratio {}", half_ratio);

    let strict = run(
        &sheet,
        &AnalyzerConfig::default().with_fill_threshold((half_ratio + 1.0) / 2.0),
    );
    assert_eq!(picks(&strict), vec![None, Some(0), None]);

    for threshold in [0.1, 0.3, 0.5, 0.7, 0.9] {
        let result = run(&sheet, &AnalyzerConfig::default().with_fill_threshold(threshold));
        for (got, was) in picks(&result).iter().zip(picks(&base).iter()) {
            assert!(got.is_none() || got == was || was.is_none());
        }
    }
}

#[test]
fn test_surplus_options_are_merged() {
    // Eight physical bubbles per row read as four options of two each.
    let layout = SheetLayout::grid(3, 8);
    let sheet = render_answers(&layout, &[Some(5), Some(0), Some(7)]);
    let result = run(&sheet, &AnalyzerConfig::default().with_expected_options(4));

    assert_eq!(picks(&result), vec![Some(2), Some(0), Some(3)]);
    assert!(result.questions.iter().all(|q| q.scores_per_option.len() == 4));
    // Raw bubbles are reported unmerged.
    assert_eq!(result.bubbles.len(), 24);
}

#[test]
fn test_short_rows_are_not_padded() {
    let layout = SheetLayout::grid(3, 3);
    let sheet = render_answers(&layout, &[Some(0), Some(1), Some(2)]);
    let result = run(&sheet, &AnalyzerConfig::default().with_expected_options(4));

    assert_eq!(picks(&result), vec![Some(0), Some(1), Some(2)]);
    assert!(result.questions.iter().all(|q| q.scores_per_option.len() == 3));
    assert_eq!(result.diagnostics.rows_matching_expected, 0);
    assert!(result.needs_review());
}

#[test]
fn test_uneven_lighting() {
    let layout = SheetLayout {
        shading: 40,
        ..SheetLayout::grid(4, 4)
    };
    let answers = vec![Some(3), Some(2), Some(1), Some(0)];
    let sheet = render_answers(&layout, &answers);
    let result = run(&sheet, &AnalyzerConfig::default().with_expected_options(4));

    assert_eq!(picks(&result), answers);
}

#[test]
fn test_heavy_shadow_keeps_empty_bubbles_empty() {
    // Right column ends up below mid-gray paper
    let layout = SheetLayout {
        shading: 150,
        ..SheetLayout::grid(4, 4)
    };
    let answers = vec![Some(0), None, Some(1), None];
    let sheet = render_answers(&layout, &answers);

    for contrast_enhancement in [true, false] {
        let config = AnalyzerConfig {
            contrast_enhancement,
            ..AnalyzerConfig::default().with_expected_options(4)
        };
        let result = run(&sheet, &config);
        assert_eq!(picks(&result), answers, "contrast {}", contrast_enhancement);
        assert_eq!(result.bubbles.len(), 16);
    }
}

#[test]
fn test_pencil_marks_are_read() {
    let layout = SheetLayout {
        paper: 245,
        fill: 130,
        ..SheetLayout::grid(4, 4)
    };
    let answers = vec![Some(0), None, Some(1), Some(3)];
    let sheet = render_answers(&layout, &answers);

    for contrast_enhancement in [true, false] {
        let config = AnalyzerConfig {
            contrast_enhancement,
            ..AnalyzerConfig::default().with_expected_options(4)
        };
        let result = run(&sheet, &config);
        assert_eq!(picks(&result), answers, "contrast {}", contrast_enhancement);
    }
}

#[test]
fn test_without_contrast_enhancement() {
    let layout = SheetLayout::grid(4, 4);
    let answers = vec![Some(1), Some(1), Some(3), Some(0)];
    let sheet = render_answers(&layout, &answers);
    let config = AnalyzerConfig {
        contrast_enhancement: false,
        ..AnalyzerConfig::default()
    };

    assert_eq!(picks(&run(&sheet, &config)), answers);
}

#[test]
fn test_blank_sheet_is_empty() {
    let sheet = RgbImage::from_pixel(400, 300, image::Rgb([250, 250, 250]));
    let result = run(&sheet, &AnalyzerConfig::default());

    assert!(result.questions.is_empty());
    assert!(result.bubbles.is_empty());
    assert!(result.diagnostics.degraded);
    assert_eq!(result.diagnostics.confidence, 0.0);
}

#[test]
fn test_relaxed_pass_recovers_small_sheets() {
    // Bubbles fall under the primary area floor but inside the relaxed one.
    let layout = SheetLayout::grid(2, 4);
    let sheet = render_answers(&layout, &[Some(2), Some(1)]);
    let config = AnalyzerConfig {
        min_bubble_area: 1800.0,
        ..AnalyzerConfig::default()
    };
    let result = run(&sheet, &config);

    let d = &result.diagnostics;
    assert!(d.retried);
    assert_eq!(d.primary_candidates, 0);
    assert_eq!(d.relaxed_candidates, 8);
    assert!(d.degraded);
    assert_eq!(picks(&result), vec![Some(2), Some(1)]);
}

#[test]
fn test_expected_questions_is_informational() {
    let layout = SheetLayout::grid(5, 4);
    let sheet = render_answers(&layout, &[Some(0); 5]);

    let matching = run(&sheet, &AnalyzerConfig::default().with_expected_questions(5));
    assert_eq!(matching.diagnostics.question_count_matches, Some(true));

    let mismatched = run(&sheet, &AnalyzerConfig::default().with_expected_questions(6));
    assert_eq!(mismatched.diagnostics.question_count_matches, Some(false));
    assert_eq!(mismatched.questions.len(), 5);
}

#[test]
fn test_debug_overlay_only_when_requested() {
    let layout = SheetLayout::grid(3, 4);
    let sheet = render_answers(&layout, &[Some(0), Some(1), Some(2)]);

    assert!(run(&sheet, &AnalyzerConfig::default()).debug_overlay.is_none());

    let result = run(&sheet, &AnalyzerConfig::default().with_debug_overlay(true));
    let overlay = result.debug_overlay.expect("overlay rendered");
    assert_eq!(overlay.dimensions(), sheet.dimensions());
}

#[test]
fn test_gray_and_rgb_inputs_agree() {
    let layout = SheetLayout::grid(3, 4);
    let sheet = render_answers(&layout, &[Some(3), None, Some(1)]);
    let gray = image::DynamicImage::ImageRgb8(sheet.clone()).to_luma8();

    let config = AnalyzerConfig::default();
    let from_rgb = run(&sheet, &config);
    let raster = RasterImage::from_gray_image(&gray).expect("valid raster");
    let from_gray = analyze(&raster, &config).expect("analysis succeeds");

    assert_eq!(picks(&from_rgb), picks(&from_gray));
}

#[test]
fn test_batch_matches_single_runs() {
    let layout = SheetLayout::grid(3, 4);
    let sheets = [
        render_answers(&layout, &[Some(0), Some(1), Some(2)]),
        render_answers(&layout, &[Some(3), Some(3), None]),
    ];
    let rasters: Vec<RasterImage<'_>> = sheets
        .iter()
        .map(|s| RasterImage::from_rgb_image(s).expect("valid raster"))
        .collect();

    let analyzer = SheetAnalyzer::default();
    let results = analyzer.analyze_batch(&rasters);
    assert_eq!(
        picks(results[0].as_ref().expect("first sheet")),
        vec![Some(0), Some(1), Some(2)]
    );
    assert_eq!(
        picks(results[1].as_ref().expect("second sheet")),
        vec![Some(3), Some(3), None]
    );
}

#[test]
fn test_grading_end_to_end() {
    let layout = SheetLayout::grid(4, 4);
    let sheet = render_answers(&layout, &[Some(0), Some(1), Some(2), None]);
    let result = run(&sheet, &AnalyzerConfig::default().with_expected_options(4));

    let key = AnswerKey::new(
        vec![
            SubjectKey {
                subject: "math".into(),
                answers: vec!['A', 'B'],
            },
            SubjectKey {
                subject: "physics".into(),
                answers: vec!['D', 'A'],
            },
        ],
        2,
    )
    .expect("valid key");
    let report = score(&key, &result.questions);

    assert_eq!(report.subjects[0].correct, 2);
    assert_eq!(report.subjects[1].correct, 0);
    assert_eq!(report.subjects[1].answered, 1);
    assert_eq!((report.correct, report.total), (2, 4));
}
