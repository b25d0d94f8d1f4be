//! Errors raised by polynomial and series operations.

use thiserror::Error;

/// The error type of all fallible operations in this crate.
///
/// Every operation that returns a [`PolyError`] leaves its operands untouched.
#[derive(Error, Debug)]
pub enum PolyError {
    /// Incompatible coefficient kinds were combined, or a value cannot be
    /// represented in the target coefficient ring.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// An argument has the right type but an unusable value.
    #[error("invalid value: {0}")]
    Value(String),
    /// An evaluation map does not cover every symbol of the polynomial.
    #[error("the evaluation map is missing the symbols {0:?}")]
    MissingSymbols(Vec<String>),
    /// The operation is not defined for these operands.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// An exponent does not fit in the monomial encoding.
    #[error("exponent overflow: {0}")]
    Overflow(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PolyError {
    /// Returns `true` for errors caused by mismatched kinds.
    pub fn is_type_error(&self) -> bool {
        matches!(self, PolyError::TypeMismatch(_))
    }

    /// Returns `true` for errors caused by an unusable argument value.
    pub fn is_value_error(&self) -> bool {
        matches!(self, PolyError::Value(_) | PolyError::MissingSymbols(_))
    }

    /// Returns `true` for operations that are not defined on their operands.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            PolyError::InvalidOperation(_) | PolyError::DivisionByZero | PolyError::Overflow(_)
        )
    }
}
