//! Answer selection per row.
//!
//! Members are ordered left to right. With an expected option count, surplus
//! members are merged by splitting the ordered row into that many contiguous
//! groups (first groups take the extra members) and averaging each group.
//! The winning option is the highest score at or above the fill threshold;
//! among equal scores the lowest option index wins.

use rayon::prelude::*;

use crate::models::{ClassifiedBubble, QuestionResult, Row};

/// Select one answer per row; `index` is the 1-based row position
pub fn select_answers(
    rows: &[Row],
    expected_options: Option<usize>,
    fill_threshold: f32,
) -> Vec<QuestionResult> {
    rows.par_iter()
        .enumerate()
        .map(|(i, row)| select_row(i + 1, row, expected_options, fill_threshold))
        .collect()
}

/// Select the answer for a single row
pub fn select_row(
    index: usize,
    row: &Row,
    expected_options: Option<usize>,
    fill_threshold: f32,
) -> QuestionResult {
    let options = ordered_options(row.bubbles(), expected_options, fill_threshold);
    let scores_per_option: Vec<f32> = options.iter().map(|b| b.fill_ratio).collect();

    QuestionResult {
        index,
        selected_option: pick_option(&scores_per_option, fill_threshold),
        scores_per_option,
    }
}

/// Row members left to right, merged down to `expected_options` if needed
pub fn ordered_options(
    bubbles: &[ClassifiedBubble],
    expected_options: Option<usize>,
    fill_threshold: f32,
) -> Vec<ClassifiedBubble> {
    let mut ordered = bubbles.to_vec();
    ordered.sort_by(|a, b| a.x.total_cmp(&b.x));

    match expected_options {
        Some(k) if k > 0 && ordered.len() > k => merge_groups(&ordered, k, fill_threshold),
        _ => ordered,
    }
}

/// Split `ordered` into `groups` contiguous chunks and average each one
pub fn merge_groups(
    ordered: &[ClassifiedBubble],
    groups: usize,
    fill_threshold: f32,
) -> Vec<ClassifiedBubble> {
    let base = ordered.len() / groups;
    let extra = ordered.len() % groups;

    let mut merged = Vec::with_capacity(groups);
    let mut start = 0;
    for g in 0..groups {
        let size = base + usize::from(g < extra);
        let chunk = &ordered[start..start + size];
        start += size;

        let n = chunk.len() as f32;
        let fill_ratio = chunk.iter().map(|b| b.fill_ratio).sum::<f32>() / n;
        merged.push(ClassifiedBubble {
            x: chunk.iter().map(|b| b.x).sum::<f32>() / n,
            y: chunk.iter().map(|b| b.y).sum::<f32>() / n,
            radius: chunk.iter().map(|b| b.radius).sum::<f32>() / n,
            fill_ratio,
            is_filled: fill_ratio >= fill_threshold,
        });
    }
    merged
}

/// Index of the maximum score if it reaches `fill_threshold`; ties go to
/// the lowest index
pub fn pick_option(scores: &[f32], fill_threshold: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.filter(|&(_, s)| s >= fill_threshold).map(|(i, _)| i)
}
