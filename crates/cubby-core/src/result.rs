//! Convenience result type alias for cubby.

use crate::error::AppError;

/// A specialized `Result` type for cubby operations.
pub type AppResult<T> = Result<T, AppError>;
