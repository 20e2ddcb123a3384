//! Convenience result type alias for plughost.

use crate::error::AppError;

/// A specialized `Result` type for plughost operations.
pub type AppResult<T> = Result<T, AppError>;
