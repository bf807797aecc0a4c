use thiserror::Error;

/// Core search errors / 検索エラー
///
/// A storage failure is always fatal and surfaces unchanged; an empty
/// result set is never represented as an error.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Input with no safe default, e.g. a malformed geo point when geo
    /// mode was explicitly requested, or a negative radius.
    #[error("invalid search input: {0}")]
    InvalidInput(String),

    /// Query or connection failure in the storage layer.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
