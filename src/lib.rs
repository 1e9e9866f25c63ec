//! Client-side photo preprocessing: pixel-level enhancement and heuristic
//! face detection, run before image bytes are handed to a remote background
//! segmentation service.
//!
//! The crate has two entry points:
//!
//! - [`Preprocessor`]: decode, byte-budget downscale, light detection
//!   priming (contrast + sharpen), and re-encode to the input's own format.
//! - [`HeuristicDetector`] / [`Enhancer`]: the detection and full
//!   enhancement algorithms, usable directly on a [`PixelBuffer`].
//!
//! # Example
//!
//! ```no_run
//! use photoprep::Preprocessor;
//!
//! let raw_bytes = std::fs::read("photo.jpg").unwrap();
//! let result = Preprocessor::new(raw_bytes)
//!     .unwrap()
//!     .enhance_faces(true)
//!     .process()
//!     .unwrap();
//! println!("Preprocessed: {} bytes", result.data.len());
//! ```
#![warn(missing_docs)]

mod enhance;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
/// Built-in skin-tone + edge-density detector backend.
pub mod heuristic_backend;
mod pixel;
mod preprocess;
mod pyramid;

/// Enhancement pipeline and its configuration.
pub use enhance::{EnhanceConfig, Enhancer};
/// Error type returned by photoprep operations.
pub use error::PhotoPrepError;
/// Face detection trait, options, and rectangle type.
pub use face_detector::{DetectOptions, FaceDetector, FaceRect};
/// Built-in heuristic detector and its configuration.
pub use heuristic_backend::{DetectorConfig, HeuristicDetector, SkinThresholds};
/// RGBA pixel grid underlying every transform.
pub use pixel::PixelBuffer;
/// Multi-resolution search support.
pub use pyramid::{build_pyramid, ScaleLevel};

/// Default byte budget: inputs above 4 MiB are downscaled before upload.
const DEFAULT_MAX_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Container format the pipeline can decode and re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// PNG (lossless re-encode).
    Png,
    /// JPEG (re-encoded at quality 90).
    Jpeg,
    /// WebP (lossless re-encode; the pure-Rust encoder has no lossy mode).
    Webp,
}

/// Result of a preprocessing run.
#[derive(Debug, Clone)]
pub struct ProcessedPhoto {
    /// The re-encoded image bytes, same container format as the input.
    pub data: Vec<u8>,

    /// The container format of `data`.
    pub format: ImageKind,

    /// Width of the output image in pixels.
    pub width: u32,

    /// Height of the output image in pixels.
    pub height: u32,

    /// Size of the original input in bytes.
    pub original_size: usize,
}

/// Builder for the preprocessing pipeline.
///
/// Validates that the input is a decodable PNG/JPEG/WebP on construction,
/// then applies byte-budget downscaling, optional detection priming, and
/// re-encoding with configurable parameters.
pub struct Preprocessor {
    input: Vec<u8>,
    enhance_faces: bool,
    detect_faces: bool,
    max_size_bytes: usize,
}

impl Preprocessor {
    /// Create a new preprocessor from raw image bytes (PNG, JPEG, or WebP).
    pub fn new(input: Vec<u8>) -> Result<Self, PhotoPrepError> {
        // Validate that the input format is one we can round-trip
        preprocess::detect_format(&input)?;

        Ok(Self {
            input,
            enhance_faces: true,
            detect_faces: true,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        })
    }

    /// Enable or disable the contrast + sharpen detection priming pass
    /// (default: true).
    pub fn enhance_faces(mut self, enable: bool) -> Self {
        self.enhance_faces = enable;
        self
    }

    /// Hint for the downstream segmentation call (default: true).
    ///
    /// The flag is threaded through for the caller's benefit and does not
    /// change this pipeline's output; face detection itself is exposed via
    /// [`HeuristicDetector`].
    pub fn detect_faces(mut self, enable: bool) -> Self {
        self.detect_faces = enable;
        self
    }

    /// Set the byte budget above which the image is downscaled
    /// (default: 4 MiB). Both dimensions shrink by
    /// `sqrt(max_size_bytes / input_len)`.
    pub fn max_size_bytes(mut self, max: usize) -> Self {
        self.max_size_bytes = max;
        self
    }

    /// Run the pipeline with the configured settings.
    pub fn process(self) -> Result<ProcessedPhoto, PhotoPrepError> {
        if self.max_size_bytes == 0 {
            return Err(PhotoPrepError::InvalidMaxSize);
        }

        preprocess::preprocess_pipeline(
            &self.input,
            self.enhance_faces,
            self.detect_faces,
            self.max_size_bytes,
        )
    }
}
