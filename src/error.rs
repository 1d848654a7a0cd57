//! Error types for sheet analysis.

/// Failures that abort the analysis of a single image.
///
/// Degraded detections are not errors: they come back as a normal
/// [`AnalysisResult`](crate::AnalysisResult) with `diagnostics.degraded` set.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Image has no pixels.
    #[error("empty image: {width}x{height}")]
    EmptyImage {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
    },

    /// Pixel buffer length does not match the declared dimensions.
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize {
        /// `width * height * channels`
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Dimensions exceed what the image buffers can address.
    #[error("image too large: {width}x{height}")]
    TooLarge {
        /// Declared width
        width: usize,
        /// Declared height
        height: usize,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Which setting failed and why
        message: String,
    },

    /// Image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl AnalysisError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for failures caused by the input raster itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyImage { .. }
                | Self::BufferSize { .. }
                | Self::TooLarge { .. }
                | Self::Image(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;
