//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the crate.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Input the engine deliberately rejects: documents outside OpenAPI 3.x,
    /// external `$ref` targets, and circular `$ref` composition.
    #[from(ignore)]
    #[display("Unsupported: {_0}")]
    Unsupported(String),

    /// Two distinct schemas derived the same synthetic type name.
    #[from(ignore)]
    #[display("Name Collision: {_0}")]
    Collision(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
