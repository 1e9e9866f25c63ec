use crate::error::PhotoPrepError;
use crate::pixel::PixelBuffer;

/// Axis-aligned detection rectangle in original-image pixel coordinates.
///
/// Coordinates are fractional because candidates found on an upsampled
/// pyramid level are rescaled back into the original image's space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRect {
    /// X coordinate of the left edge (pixels).
    pub left: f32,
    /// Y coordinate of the top edge (pixels).
    pub top: f32,
    /// Width of the rectangle (pixels).
    pub width: f32,
    /// Height of the rectangle (pixels).
    pub height: f32,
}

impl FaceRect {
    /// Construct from the left/top corner and extents.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Rectangle area in square pixels.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Bounding union of two rectangles.
    pub fn union(&self, other: &FaceRect) -> FaceRect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        FaceRect::new(left, top, right - left, bottom - top)
    }

    /// Overlap ratio: intersection area divided by the smaller rectangle's
    /// area. Returns 0.0 for disjoint rectangles or degenerate areas.
    pub fn overlap_ratio(&self, other: &FaceRect) -> f32 {
        let iw = (self.right().min(other.right()) - self.left.max(other.left)).max(0.0);
        let ih = (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0);
        let intersection = iw * ih;
        let smaller = self.area().min(other.area());
        if smaller <= 0.0 {
            return 0.0;
        }
        intersection / smaller
    }
}

/// Per-call knobs for face detection.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Smallest face dimension worth searching for, in pixels.
    pub min_face_size: u32,
    /// Pyramid growth factor per level; must be greater than 1.0.
    pub scale_factor: f32,
    /// Minimum combined skin/edge score for a window to become a candidate.
    pub confidence_threshold: f32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            min_face_size: 20,
            scale_factor: 1.1,
            confidence_threshold: 0.8,
        }
    }
}

/// Pluggable face detection backend.
///
/// The built-in implementation is [`crate::HeuristicDetector`]; callers can
/// substitute their own engine behind the same seam.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in `buffer`, returning rectangles in original-image
    /// coordinates. An empty result is a valid outcome, not an error.
    fn detect(
        &self,
        buffer: &PixelBuffer,
        options: &DetectOptions,
    ) -> Result<Vec<FaceRect>, PhotoPrepError>;
}
