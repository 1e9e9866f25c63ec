//! Pixel-level enhancement filters.
//!
//! Two pipelines share these stages:
//! - [`Enhancer::enhance`]: the full four-step pipeline (histogram
//!   equalization, contrast, sharpen, median denoise), in that order.
//! - [`Enhancer::enhance_for_detection`]: the lighter contrast + sharpen
//!   pair applied by the preprocess pipeline before detection. The two are
//!   deliberately separate pipelines, not one with flags.
//!
//! Every stage reads its input buffer and writes a fresh output buffer, so
//! no stage ever observes its own partially written results.

use crate::pixel::PixelBuffer;

/// Default contrast multiplier.
const CONTRAST_FACTOR: f32 = 1.2;

/// Default 3x3 sharpen kernel, row-major.
const SHARPEN_KERNEL: [i32; 9] = [0, -1, 0, -1, 5, -1, 0, -1, 0];

/// Constants driving the enhancement stages.
///
/// Defaults reproduce the production pipeline; tests can substitute values
/// without touching the algorithms.
#[derive(Debug, Clone)]
pub struct EnhanceConfig {
    /// Contrast multiplier applied as `factor * v + 128 * (1 - factor)`.
    pub contrast_factor: f32,
    /// 3x3 convolution kernel for the sharpen stage, row-major.
    pub sharpen_kernel: [i32; 9],
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            contrast_factor: CONTRAST_FACTOR,
            sharpen_kernel: SHARPEN_KERNEL,
        }
    }
}

/// Applies the enhancement pipelines to a [`PixelBuffer`].
#[derive(Debug, Clone, Default)]
pub struct Enhancer {
    config: EnhanceConfig,
}

impl Enhancer {
    /// Create an enhancer with the given configuration.
    pub fn new(config: EnhanceConfig) -> Self {
        Self { config }
    }

    /// Run the full four-step pipeline. The output has the same dimensions
    /// as the input; the input is left untouched.
    pub fn enhance(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let equalized = equalize_histogram(buffer);
        let contrasted = adjust_contrast(&equalized, self.config.contrast_factor);
        let sharpened = sharpen(&contrasted, &self.config.sharpen_kernel);
        median_denoise(&sharpened)
    }

    /// Run only the contrast + sharpen pair used to prime face detection.
    pub fn enhance_for_detection(&self, buffer: &PixelBuffer) -> PixelBuffer {
        let contrasted = adjust_contrast(buffer, self.config.contrast_factor);
        sharpen(&contrasted, &self.config.sharpen_kernel)
    }
}

/// Histogram equalization on per-pixel luminance.
///
/// Builds a 256-bin histogram of `round((R+G+B)/3)`, derives the cumulative
/// distribution, and remaps all three color channels through one shared
/// table. A perfectly uniform image would make the normalization
/// denominator zero; that case passes the input through unchanged.
pub(crate) fn equalize_histogram(src: &PixelBuffer) -> PixelBuffer {
    let data = src.as_raw();
    let total = (src.width() as u64) * (src.height() as u64);

    let mut histogram = [0u64; 256];
    for px in data.chunks_exact(4) {
        let brightness = (px[0] as u32 + px[1] as u32 + px[2] as u32) as f32 / 3.0;
        histogram[brightness.round() as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (bin, count) in histogram.iter().enumerate() {
        running += count;
        cdf[bin] = running;
    }

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total <= cdf_min {
        return src.clone();
    }
    let denom = (total - cdf_min) as f64;

    let mut table = [0u8; 256];
    for (v, entry) in table.iter_mut().enumerate() {
        let scaled = (cdf[v] as f64 - cdf_min as f64) / denom * 255.0;
        *entry = scaled.round().clamp(0.0, 255.0) as u8;
    }

    let mut out = src.clone();
    for px in out.as_raw_mut().chunks_exact_mut(4) {
        px[0] = table[px[0] as usize];
        px[1] = table[px[1] as usize];
        px[2] = table[px[2] as usize];
    }
    out
}

/// Linear contrast adjustment: `clamp(round(factor * v + 128 * (1 - factor)))`
/// per color channel. Alpha is untouched.
pub(crate) fn adjust_contrast(src: &PixelBuffer, factor: f32) -> PixelBuffer {
    let offset = 128.0 * (1.0 - factor);
    let mut out = src.clone();
    for px in out.as_raw_mut().chunks_exact_mut(4) {
        for v in px.iter_mut().take(3) {
            *v = (factor * *v as f32 + offset).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// 3x3 convolution over the interior, per color channel.
///
/// Reads exclusively from `src` so already-sharpened neighbors never feed
/// back into the sum. The one-pixel border is copied through unmodified.
/// Buffers smaller than 3x3 have no interior and pass through unchanged.
pub(crate) fn sharpen(src: &PixelBuffer, kernel: &[i32; 9]) -> PixelBuffer {
    let (width, height) = (src.width(), src.height());
    if width < 3 || height < 3 {
        return src.clone();
    }

    let input = src.as_raw();
    let mut out = src.clone();
    let row_stride = width as usize * 4;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = src.offset(x, y);
            for c in 0..3 {
                let mut sum = 0i32;
                for ky in 0..3usize {
                    for kx in 0..3usize {
                        let idx = (center as isize
                            + (ky as isize - 1) * row_stride as isize
                            + (kx as isize - 1) * 4) as usize;
                        sum += input[idx + c] as i32 * kernel[ky * 3 + kx];
                    }
                }
                out.as_raw_mut()[center + c] = sum.clamp(0, 255) as u8;
            }
        }
    }
    out
}

/// 3x3 median filter over the interior, per color channel.
///
/// Collects the nine neighborhood samples from the pre-filter buffer, sorts
/// them, and takes the middle element. Border pixels and buffers smaller
/// than 3x3 are unmodified.
pub(crate) fn median_denoise(src: &PixelBuffer) -> PixelBuffer {
    let (width, height) = (src.width(), src.height());
    if width < 3 || height < 3 {
        return src.clone();
    }

    let input = src.as_raw();
    let mut out = src.clone();
    let row_stride = width as usize * 4;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = src.offset(x, y);
            for c in 0..3 {
                let mut window = [0u8; 9];
                for ky in 0..3usize {
                    for kx in 0..3usize {
                        let idx = (center as isize
                            + (ky as isize - 1) * row_stride as isize
                            + (kx as isize - 1) * 4) as usize;
                        window[ky * 3 + kx] = input[idx + c];
                    }
                }
                window.sort_unstable();
                out.as_raw_mut()[center + c] = window[4];
            }
        }
    }
    out
}
