//! Built-in classical face detector: skin-tone ratio + edge density scored
//! over sliding windows at multiple pyramid scales. A heuristic, not a
//! trained classifier; it serves as a cheap pre-pass ahead of a remote
//! segmentation service, nothing more.

use log::debug;

use crate::error::PhotoPrepError;
use crate::face_detector::{DetectOptions, FaceDetector, FaceRect};
use crate::pixel::PixelBuffer;
use crate::pyramid::build_pyramid;

/// Per-pixel skin-color classification thresholds.
///
/// A pixel counts as skin-like when all of the following hold:
/// `R > min_red`, `G > min_green`, `B > min_blue`, `R > G`, `R > B`,
/// `R - G > min_red_green_gap`, `max(R,G,B) - min(R,G,B) > min_channel_spread`,
/// `R/(R+G+B) > min_normalized_red`, and `G/(R+G+B) < max_normalized_green`.
/// A fully black pixel (`R+G+B == 0`) is never skin.
#[derive(Debug, Clone)]
pub struct SkinThresholds {
    /// Minimum red channel value.
    pub min_red: u8,
    /// Minimum green channel value.
    pub min_green: u8,
    /// Minimum blue channel value.
    pub min_blue: u8,
    /// Minimum excess of red over green.
    pub min_red_green_gap: i32,
    /// Minimum spread between the largest and smallest channel.
    pub min_channel_spread: i32,
    /// Minimum red share of the channel sum.
    pub min_normalized_red: f32,
    /// Maximum green share of the channel sum.
    pub max_normalized_green: f32,
}

impl Default for SkinThresholds {
    fn default() -> Self {
        Self {
            min_red: 95,
            min_green: 40,
            min_blue: 20,
            min_red_green_gap: 15,
            min_channel_spread: 15,
            min_normalized_red: 0.35,
            max_normalized_green: 0.36,
        }
    }
}

/// All constants driving the detector, in one substitutable place.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Square window sizes slid over every pyramid level, in pixels.
    pub window_sizes: Vec<u32>,
    /// Weight of the skin-ratio term in the combined confidence.
    pub skin_weight: f32,
    /// Weight of the edge-strength term in the combined confidence.
    pub edge_weight: f32,
    /// Multiplier applied to the skin ratio before capping at 1.
    pub skin_ratio_gain: f32,
    /// Average edge strength that counts as a full edge score.
    pub edge_normalizer: f32,
    /// Overlap ratio (strictly) above which two candidates merge.
    pub overlap_threshold: f32,
    /// Upper bound on pyramid levels; the upsampling pyramid cannot
    /// terminate on its own for inputs at or above the minimum face size.
    pub max_pyramid_levels: usize,
    /// Per-pixel skin classification thresholds.
    pub skin: SkinThresholds,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_sizes: vec![24, 36, 48, 64],
            skin_weight: 0.7,
            edge_weight: 0.3,
            skin_ratio_gain: 2.0,
            edge_normalizer: 30.0,
            overlap_threshold: 0.3,
            max_pyramid_levels: 5,
            skin: SkinThresholds::default(),
        }
    }
}

/// A square candidate at pyramid-level coordinates.
#[derive(Debug, Clone, Copy)]
struct DetectionWindow {
    x: u32,
    y: u32,
    size: u32,
}

impl DetectionWindow {
    /// Express the window in original-image coordinates.
    fn to_face_rect(self, scale_factor: f32) -> FaceRect {
        FaceRect::new(
            self.x as f32 / scale_factor,
            self.y as f32 / scale_factor,
            self.size as f32 / scale_factor,
            self.size as f32 / scale_factor,
        )
    }
}

/// The built-in heuristic detector.
#[derive(Debug, Clone, Default)]
pub struct HeuristicDetector {
    config: DetectorConfig,
}

impl HeuristicDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Borrow the active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl FaceDetector for HeuristicDetector {
    fn detect(
        &self,
        buffer: &PixelBuffer,
        options: &DetectOptions,
    ) -> Result<Vec<FaceRect>, PhotoPrepError> {
        let pyramid = build_pyramid(
            buffer,
            options.min_face_size,
            options.scale_factor,
            self.config.max_pyramid_levels,
        )?;

        // Fixed level -> size -> scan order keeps the candidate list, and
        // therefore the merge result, deterministic.
        let mut candidates = Vec::new();
        for level in &pyramid {
            for &size in &self.config.window_sizes {
                for window in
                    scan_level(&level.buffer, size, options.confidence_threshold, &self.config)
                {
                    candidates.push(window.to_face_rect(level.scale_factor));
                }
            }
        }
        debug!(
            "{} candidate window(s) across {} pyramid level(s)",
            candidates.len(),
            pyramid.len()
        );

        let merged = merge_detections(candidates, self.config.overlap_threshold);
        debug!("{} detection(s) after overlap merge", merged.len());
        Ok(merged)
    }
}

/// Slide one window size over a pyramid level, collecting every position
/// whose confidence clears the threshold. The stride is a quarter of the
/// window size; the scan range is exclusive, so windows stop short of the
/// right/bottom edge.
fn scan_level(
    buffer: &PixelBuffer,
    size: u32,
    threshold: f32,
    config: &DetectorConfig,
) -> Vec<DetectionWindow> {
    let mut hits = Vec::new();
    if size >= buffer.width() || size >= buffer.height() {
        return hits;
    }

    let stride = (size / 4).max(1) as usize;
    for y in (0..buffer.height() - size).step_by(stride) {
        for x in (0..buffer.width() - size).step_by(stride) {
            if score_window(buffer, x, y, size, config) >= threshold {
                hits.push(DetectionWindow { x, y, size });
            }
        }
    }
    hits
}

/// Score one square window: weighted blend of skin-pixel ratio and average
/// edge strength, each capped at 1, yielding a confidence in [0, 1].
pub(crate) fn score_window(
    buffer: &PixelBuffer,
    x: u32,
    y: u32,
    size: u32,
    config: &DetectorConfig,
) -> f32 {
    let mut skin_pixels = 0u32;
    let mut edge_total = 0.0f32;

    for dy in 0..size {
        for dx in 0..size {
            let [r, g, b, _] = buffer.rgba(x + dx, y + dy);
            if is_skin_color(r, g, b, &config.skin) {
                skin_pixels += 1;
            }
            if dx > 0 && dy > 0 {
                edge_total += edge_strength(buffer, x + dx, y + dy);
            }
        }
    }

    let window_area = (size * size) as f32;
    let skin_ratio = skin_pixels as f32 / window_area;
    let avg_edge = edge_total / window_area;

    config.skin_weight * (skin_ratio * config.skin_ratio_gain).min(1.0)
        + config.edge_weight * (avg_edge / config.edge_normalizer).min(1.0)
}

/// Classify one RGB sample against the skin thresholds.
fn is_skin_color(r: u8, g: u8, b: u8, skin: &SkinThresholds) -> bool {
    let sum = r as u32 + g as u32 + b as u32;
    if sum == 0 {
        return false;
    }

    let max = r.max(g).max(b) as i32;
    let min = r.min(g).min(b) as i32;
    let normalized_r = r as f32 / sum as f32;
    let normalized_g = g as f32 / sum as f32;

    r > skin.min_red
        && g > skin.min_green
        && b > skin.min_blue
        && r > g
        && r > b
        && (r as i32 - g as i32) > skin.min_red_green_gap
        && (max - min) > skin.min_channel_spread
        && normalized_r > skin.min_normalized_red
        && normalized_g < skin.max_normalized_green
}

/// Gradient magnitude at (x, y) against the left and upper neighbors,
/// sampled on the red channel only. Caller guarantees `x >= 1 && y >= 1`.
fn edge_strength(buffer: &PixelBuffer, x: u32, y: u32) -> f32 {
    let here = buffer.rgba(x, y)[0] as f32;
    let left = buffer.rgba(x - 1, y)[0] as f32;
    let above = buffer.rgba(x, y - 1)[0] as f32;
    let dx = here - left;
    let dy = here - above;
    (dx * dx + dy * dy).sqrt()
}

/// Merge overlapping candidates into final detections.
///
/// Each pass walks the list in index order: the first unused rectangle
/// absorbs every later unused rectangle whose overlap ratio strictly
/// exceeds `threshold`, growing into the bounding union as it goes
/// (first-seen precedence). Passes repeat until one absorbs nothing, so a
/// rectangle skipped early still merges once the cluster has grown around
/// it.
pub(crate) fn merge_detections(mut rects: Vec<FaceRect>, threshold: f32) -> Vec<FaceRect> {
    loop {
        let mut used = vec![false; rects.len()];
        let mut merged = Vec::with_capacity(rects.len());
        let mut absorbed = false;

        for i in 0..rects.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let mut current = rects[i];
            for j in i + 1..rects.len() {
                if used[j] {
                    continue;
                }
                if current.overlap_ratio(&rects[j]) > threshold {
                    current = current.union(&rects[j]);
                    used[j] = true;
                    absorbed = true;
                }
            }
            merged.push(current);
        }

        rects = merged;
        if !absorbed {
            return rects;
        }
    }
}
