use serde::Serialize;

use super::Point;

/// A region that geometrically resembles a bubble. Geometry only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleCandidate {
    /// Center X (minimal enclosing circle)
    pub x: f32,
    /// Center Y (minimal enclosing circle)
    pub y: f32,
    /// Radius of the minimal enclosing circle
    pub radius: f32,
}

impl BubbleCandidate {
    /// Create a new candidate
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    /// Center as a point
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A candidate together with its fill measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifiedBubble {
    /// Center X
    pub x: f32,
    /// Center Y
    pub y: f32,
    /// Radius
    pub radius: f32,
    /// Fraction of the inner disc classified dark, in `[0, 1]`
    pub fill_ratio: f32,
    /// `fill_ratio >= fill_threshold`
    pub is_filled: bool,
}

impl ClassifiedBubble {
    /// Attach a fill measurement to a candidate
    pub fn new(candidate: BubbleCandidate, fill_ratio: f32, fill_threshold: f32) -> Self {
        Self {
            x: candidate.x,
            y: candidate.y,
            radius: candidate.radius,
            fill_ratio,
            is_filled: fill_ratio >= fill_threshold,
        }
    }
}

/// Bubbles sharing one horizontal band, i.e. one question
#[derive(Debug, Clone, Default)]
pub struct Row {
    bubbles: Vec<ClassifiedBubble>,
    sum_y: f64,
}

impl Row {
    /// Start a row from its first bubble
    pub fn start(bubble: ClassifiedBubble) -> Self {
        Self {
            sum_y: bubble.y as f64,
            bubbles: vec![bubble],
        }
    }

    /// Append a bubble and update the running mean
    pub fn push(&mut self, bubble: ClassifiedBubble) {
        self.sum_y += bubble.y as f64;
        self.bubbles.push(bubble);
    }

    /// Running mean of member y coordinates
    pub fn mean_y(&self) -> f32 {
        if self.bubbles.is_empty() {
            return 0.0;
        }
        (self.sum_y / self.bubbles.len() as f64) as f32
    }

    /// Members in insertion order
    pub fn bubbles(&self) -> &[ClassifiedBubble] {
        &self.bubbles
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    /// True if the row has no members
    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classified_threshold_is_inclusive() {
        let c = BubbleCandidate::new(10.0, 20.0, 5.0);
        assert!(ClassifiedBubble::new(c, 0.35, 0.35).is_filled);
        assert!(!ClassifiedBubble::new(c, 0.34, 0.35).is_filled);
    }

    #[test]
    fn test_row_running_mean() {
        let c = |y| ClassifiedBubble::new(BubbleCandidate::new(0.0, y, 5.0), 0.0, 0.35);
        let mut row = Row::start(c(100.0));
        row.push(c(110.0));
        assert_eq!(row.mean_y(), 105.0);
        assert_eq!(row.len(), 2);
    }
}
