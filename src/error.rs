use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoPrepError {
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("scale factor must be greater than 1.0, got {0}")]
    InvalidScaleFactor(f32),

    #[error("max size must be > 0")]
    InvalidMaxSize,
}
