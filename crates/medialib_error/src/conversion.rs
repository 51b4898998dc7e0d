//! Conversion error types.

/// Kinds of conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConversionErrorKind {
    /// A conversion's derive function failed on the given input
    #[display("Derivation failed for conversion '{}': {}", name, reason)]
    Derivation {
        /// Conversion name
        name: String,
        /// Failure reason reported by the derive function
        reason: String,
    },
    /// Requested conversion name is not materialized for the record
    #[display("Unknown conversion: {}", _0)]
    UnknownConversion(String),
}

/// Conversion error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Conversion Error: {} at line {} in {}", kind, line, file)]
pub struct ConversionError {
    /// The kind of error that occurred
    pub kind: ConversionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ConversionError {
    /// Create a new conversion error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConversionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
