//! Data types passed between pipeline stages and returned to callers

/// Bubble candidates, classified bubbles and question rows
pub mod bubble;
/// Image-space points
pub mod point;
/// Borrowed input images
pub mod raster;
/// Per-question answers and sheet diagnostics
pub mod result;

pub use bubble::{BubbleCandidate, ClassifiedBubble, Row};
pub use point::Point;
pub use raster::{PixelLayout, RasterImage};
pub use result::{AnalysisResult, Diagnostics, QuestionResult, option_letter};
