use thiserror::Error;

/// Helper macro for creating [`Error::Malformed`] values that carry the source location.
///
/// ```rust, ignore
/// return Err(malformed_error!("Invalid version component: {}", part));
/// ```
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Failures are scoped to a single unit: a traversal that hits one of these errors is aborted
/// for that unit only, the error is reported through the diagnostic sink and the unit is left
/// untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// The input could not be interpreted, e.g. an assembly display name with a broken
    /// `PublicKeyToken` or a non-numeric version component.
    ///
    /// The error carries the source location where it was raised, which helps when
    /// tracking down which of the permissive parsers rejected the input.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// No debug-symbol provider is registered for the unit at the given location.
    ///
    /// Rewriters that need source text cannot make progress without symbols, so the
    /// whole unit is skipped.
    #[error("missing symbols for {0}")]
    MissingSymbols(String),

    /// The traversal exceeded the configured maximum nesting depth.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// A unit with the same identity is already present in the arena.
    #[error("A unit with identity '{0}' already exists")]
    DuplicateUnit(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
