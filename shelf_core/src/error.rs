use thiserror::Error;

/// Error conditions surfaced by the shelf core. Cosmetic failures (cover
/// textures) never show up here; they are absorbed by the mesh pool.
#[derive(Debug, Error, PartialEq)]
pub enum ShelfError {
    #[error("add-new sentinel found at index {index} of {len}; it must be the last entry")]
    MisplacedSentinel { index: usize, len: usize },
    #[error("row count must be at least 1 (got {0})")]
    InvalidRows(u32),
    #[error("tuning value `{field}` must be positive and finite (got {value})")]
    InvalidTuning { field: &'static str, value: f32 },
    #[error("cover atlas slice `{0}` has no area")]
    EmptyAtlasSlice(&'static str),
}

pub type Result<T> = std::result::Result<T, ShelfError>;

/// Why a cover texture could not be produced. Reported back to the pool,
/// which turns it into a retry or the fallback colour.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoverLoadError {
    #[error("cover image not found: {0}")]
    Missing(String),
    #[error("failed to read cover {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to decode cover {path}: {reason}")]
    Decode { path: String, reason: String },
}
