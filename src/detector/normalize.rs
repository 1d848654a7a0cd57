/// Image normalization: grayscale, optional tile contrast enhancement, 5x5
/// smoothing, inverted adaptive binarization and a 3x3 closing
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::close;
use log::debug;

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::models::RasterImage;
use crate::utils::binarization::adaptive_binarize_inv;
use crate::utils::contrast::equalize_tiles;
use crate::utils::grayscale::to_grayscale;

/// Binomial [1 4 6 4 1] / 16, applied along both axes
pub const SMOOTHING_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Buffers produced by normalization, owned for one analysis call
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Dark marks are 255, paper is 0
    pub binary: GrayImage,
    /// Smoothed (and possibly enhanced) luminance
    pub smoothed: GrayImage,
    /// Whether contrast enhancement was applied
    pub enhanced: bool,
}

/// Run the fixed normalization sequence on a raster
pub fn normalize(raster: &RasterImage<'_>, config: &AnalyzerConfig) -> Result<NormalizedImage> {
    let (width, height) = (raster.width(), raster.height());
    let too_large = || AnalysisError::TooLarge { width, height };
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;

    let gray = to_grayscale(raster);

    let (gray, enhanced) = if config.contrast_enhancement {
        match equalize_tiles(&gray, width, height, config.clahe_clip_limit, config.clahe_tiles) {
            Ok(equalized) => (equalized, true),
            Err(err) => {
                debug!("contrast enhancement skipped: {}", err);
                (gray, false)
            }
        }
    } else {
        (gray, false)
    };

    let size_mismatch = |actual: usize| AnalysisError::BufferSize {
        expected: width * height,
        actual,
    };
    let gray_len = gray.len();
    let gray = GrayImage::from_raw(w, h, gray).ok_or_else(|| size_mismatch(gray_len))?;
    let smoothed = separable_filter_equal(&gray, &SMOOTHING_KERNEL);
    drop(gray);

    let binary = adaptive_binarize_inv(
        smoothed.as_raw(),
        width,
        height,
        config.adaptive_block_radius,
        config.adaptive_offset,
    );
    let binary_len = binary.len();
    let binary = GrayImage::from_raw(w, h, binary).ok_or_else(|| size_mismatch(binary_len))?;

    // k = 1 under the L-infinity norm is a 3x3 square structuring element.
    let binary = close(&binary, Norm::LInf, 1);

    debug!(
        "normalized {}x{} (contrast enhancement: {})",
        width, height, enhanced
    );

    Ok(NormalizedImage {
        binary,
        smoothed,
        enhanced,
    })
}
