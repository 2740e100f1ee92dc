use thiserror::Error;

/// Fallible operations at the host/I-O boundary. Parsing and validating a
/// document are infallible by construction — malformed input becomes
/// diagnostics, never an `Err` — so this enum only covers what sits around
/// that core: reading schema files and converting positions for the LSP
/// wire format.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// Schema file could not be read from disk.
    #[error("Failed to read schema file: {0}")]
    SchemaFileReadError(#[from] std::io::Error),

    /// The schema document itself is not valid JSON.
    #[error("Invalid JSON schema provided: {0}")]
    InvalidSchemaError(#[from] serde_json::Error),

    /// A `usize` byte offset or line/column did not fit in the `u32` the
    /// LSP wire format requires.
    #[error("Position conversion overflow at byte offset {0}")]
    PositionConversionError(usize),
}

pub type ValidationResult<T> = Result<T, SchemaValidationError>;
