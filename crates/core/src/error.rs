#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Reasons a speed-limit lookup can fail.
///
/// None of these are fatal: the limit cache absorbs them and keeps serving
/// its last confirmed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The external call exceeded its hard timeout.
    #[error("Speed limit lookup timed out")]
    Timeout,

    /// Network failure or a non-success response from the data source.
    #[error("Speed limit source unavailable: {0}")]
    Unavailable(String),

    /// The source answered, but nothing near the point carries a usable limit.
    #[error("No usable speed limit near this point")]
    NoData,

    /// The response body could not be decoded.
    #[error("Malformed speed limit response: {0}")]
    Parse(String),
}
