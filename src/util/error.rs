//! Error types for gwbank.

use thiserror::Error;

/// Result alias for gwbank operations.
pub type GwBankResult<T> = std::result::Result<T, GwBankError>;

/// Errors that can occur when building or reading a filter bank.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GwBankError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A bank configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// An index is outside the addressable range.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// A caller-supplied buffer is shorter than required.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The approximant name is not known to this crate.
    #[error("unknown approximant: {name}")]
    UnknownApproximant { name: String },
    /// A generator option is not recognized by the approximant family.
    #[error("option `{option}` is not supported by approximant {approximant}")]
    UnsupportedOption {
        option: &'static str,
        approximant: &'static str,
    },
    /// The generator rejected the physical parameters of a template.
    #[error("invalid template parameters: {reason}")]
    InvalidParameters { reason: String },
    /// The noise spectrum does not line up with the bank.
    #[error("noise spectrum mismatch: {reason}")]
    PsdMismatch { reason: String },
    /// The template cache could not be opened.
    #[error("failed to open template cache {path}: {reason}")]
    CacheOpen { path: String, reason: String },
    /// The template cache has no entry for a key.
    #[error("template cache has no entry `{key}`")]
    MissingCacheEntry { key: String },
    /// Cached samples were produced at a different rate than configured.
    #[error("sample rate mismatch: expected {expected} Hz, got {got} Hz")]
    SampleRateMismatch { expected: f64, got: f64 },
    /// The template table document could not be parsed.
    #[error("failed to parse template table: {reason}")]
    TableParse { reason: String },
}
