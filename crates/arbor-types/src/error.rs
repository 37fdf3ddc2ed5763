//! Unified error interface for arbor.
//!
//! This module provides the [`ErrorCode`] trait for standardized
//! error handling across the arbor crates.
//!
//! # Design
//!
//! All arbor error types implement [`ErrorCode`] to provide:
//!
//! - **Machine-readable codes**: for programmatic error handling
//! - **Recoverability info**: programming errors are never
//!   recoverable and abort the request, while user-input and document
//!   errors are surfaced as validation state
//!
//! # Example
//!
//! ```
//! use arbor_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     NotFound(String),
//!     BadValue,
//! }
//!
//! impl ErrorCode for MyError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::NotFound(_) => "MY_NOT_FOUND",
//!             Self::BadValue => "MY_BAD_VALUE",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::BadValue)
//!     }
//! }
//!
//! let err = MyError::BadValue;
//! assert_eq!(err.code(), "MY_BAD_VALUE");
//! assert!(err.is_recoverable());
//! ```

/// Unified error code interface for arbor errors.
///
/// # Code Format
///
/// Error codes should be:
///
/// - **UPPER_SNAKE_CASE**: e.g., `"TREE_NO_SUCH_PATH"`
/// - **Layer-prefixed**: `"TREE_"`, `"WIDGET_"`, `"CTRL_"`, `"DOC_"`, `"JOB_"`
/// - **Stable**: codes should not change once defined (API contract)
///
/// # Recoverability
///
/// Recoverable errors are the ones a caller or operator can do
/// something about: malformed submitted values, a document written by a
/// newer version, an engine failure worth retrying. Programming errors
/// (invariant violations such as double-attach or answering with no
/// pending question) are never recoverable and should abort the
/// enclosing request loudly.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    ///
    /// # Returns
    ///
    /// - `true`: retry or corrective user action may help
    /// - `false`: invariant violation, requires a code change
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows arbor conventions.
///
/// # Checks
///
/// 1. Code is UPPER_SNAKE_CASE
/// 2. Code starts with the expected prefix
/// 3. Code is not empty
///
/// # Panics
///
/// Panics with a descriptive message if validation fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );

    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates multiple error codes at once.
///
/// Use this to verify all variants of an error enum.
///
/// # Example
///
/// ```
/// use arbor_types::{ErrorCode, assert_error_codes};
///
/// #[derive(Debug)]
/// enum MyError { A, B }
///
/// impl ErrorCode for MyError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::A => "MY_A",
///             Self::B => "MY_B",
///         }
///     }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_codes(&[MyError::A, MyError::B], "MY_");
/// ```
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

/// Checks if a string is UPPER_SNAKE_CASE.
fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    if s.starts_with('_') || s.ends_with('_') {
        return false;
    }

    if s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
