//! Upsampling scale pyramid for multi-resolution window search.
//!
//! Unlike the usual coarse-to-fine pyramid, this one grows the image: each
//! level multiplies the running scale by `scale_factor` (> 1) so that small,
//! distant faces become large enough for the fixed window sizes. Because an
//! upsampling pyramid never shrinks below `min_size` on its own, the level
//! count is bounded by an explicit `max_levels` cap.

use crate::error::PhotoPrepError;
use crate::pixel::PixelBuffer;

/// One resolution variant of the source image.
///
/// `scale_factor` relates level coordinates back to the original:
/// `original_coord = level_coord / scale_factor`.
#[derive(Debug, Clone)]
pub struct ScaleLevel {
    /// The resized image at this level.
    pub buffer: PixelBuffer,
    /// Scale of this level relative to the original image.
    pub scale_factor: f32,
}

/// Build the scale pyramid for `buffer`.
///
/// Level 0 is always the original at scale 1.0. Subsequent levels are
/// bilinear resizes at geometrically growing scales. Generation stops when
/// either resulting dimension would fall below `min_size` or when
/// `max_levels` levels exist. Deterministic for identical inputs.
pub fn build_pyramid(
    buffer: &PixelBuffer,
    min_size: u32,
    scale_factor: f32,
    max_levels: usize,
) -> Result<Vec<ScaleLevel>, PhotoPrepError> {
    if scale_factor <= 1.0 {
        return Err(PhotoPrepError::InvalidScaleFactor(scale_factor));
    }

    let mut levels = vec![ScaleLevel {
        buffer: buffer.clone(),
        scale_factor: 1.0,
    }];

    let mut scale = 1.0f32;
    while levels.len() < max_levels.max(1) {
        scale *= scale_factor;
        let new_width = (buffer.width() as f32 * scale).round() as u32;
        let new_height = (buffer.height() as f32 * scale).round() as u32;
        if new_width < min_size || new_height < min_size {
            break;
        }
        levels.push(ScaleLevel {
            buffer: buffer.resize_bilinear(new_width, new_height)?,
            scale_factor: scale,
        });
    }

    log::debug!(
        "built {} pyramid level(s) for {}x{} input",
        levels.len(),
        buffer.width(),
        buffer.height()
    );
    Ok(levels)
}
