/// Row clustering: one forward scan over bubbles in reading order, grouping
/// those whose y stays within a resolution-adaptive tolerance of the current
/// row's running mean
use crate::models::{ClassifiedBubble, Row};

/// Lower bound on the row tolerance (px)
pub const MIN_ROW_TOLERANCE: f32 = 8.0;
/// Image height divided by this gives the resolution-scaled tolerance
pub const ROW_TOLERANCE_DIVISOR: f32 = 200.0;

/// `max(8, height / 200)`
pub fn row_tolerance(image_height: usize) -> f32 {
    (image_height as f32 / ROW_TOLERANCE_DIVISOR).max(MIN_ROW_TOLERANCE)
}

/// Sort by y, then x
pub fn sort_reading_order(bubbles: &mut [ClassifiedBubble]) {
    bubbles.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
}

/// Group bubbles (already in reading order) into rows, top to bottom.
///
/// Assumes rows do not interleave vertically, i.e. residual skew is smaller
/// than the tolerance.
pub fn cluster_rows(bubbles: &[ClassifiedBubble], image_height: usize) -> Vec<Row> {
    let tolerance = row_tolerance(image_height);
    let mut rows: Vec<Row> = Vec::new();

    for &bubble in bubbles {
        match rows.last_mut() {
            Some(row) if (bubble.y - row.mean_y()).abs() <= tolerance => row.push(bubble),
            _ => rows.push(Row::start(bubble)),
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BubbleCandidate;

    fn bubble(x: f32, y: f32) -> ClassifiedBubble {
        ClassifiedBubble::new(BubbleCandidate::new(x, y, 10.0), 0.0, 0.35)
    }

    #[test]
    fn test_row_tolerance() {
        assert_eq!(row_tolerance(2000), 10.0);
        assert_eq!(row_tolerance(800), 8.0);
        assert_eq!(row_tolerance(0), 8.0);
        assert_eq!(row_tolerance(4000), 20.0);
    }

    #[test]
    fn test_same_row_within_tolerance() {
        let rows = cluster_rows(&[bubble(10.0, 100.0), bubble(50.0, 109.0)], 2000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_new_row_past_tolerance() {
        let rows = cluster_rows(&[bubble(10.0, 100.0), bubble(50.0, 111.0)], 2000);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bubbles()[0].y, 100.0);
        assert_eq!(rows[1].bubbles()[0].y, 111.0);
    }

    #[test]
    fn test_running_mean_tracks_drift() {
        // Each step is within tolerance of the mean, not only of the first bubble.
        let rows = cluster_rows(
            &[bubble(0.0, 100.0), bubble(10.0, 108.0), bubble(20.0, 113.0)],
            2000,
        );
        assert_eq!(rows.len(), 1);
        assert!((rows[0].mean_y() - 107.0).abs() < 1e-4);
    }

    #[test]
    fn test_sort_and_cluster_grid() {
        let mut bubbles = Vec::new();
        for row in (0..3).rev() {
            for col in (0..4).rev() {
                bubbles.push(bubble(col as f32 * 40.0, row as f32 * 50.0 + (col % 2) as f32));
            }
        }
        sort_reading_order(&mut bubbles);
        let rows = cluster_rows(&bubbles, 600);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 4));
        assert!(rows[0].mean_y() < rows[1].mean_y());
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_rows(&[], 1000).is_empty());
    }
}
