use core::fmt;

/// Error codes raised by the query engine.
///
/// None of these are user input errors: they report query graphs that were
/// wired up incorrectly or driven out of contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `advance`/`count` on a query that was never bound by `evaluate`.
    ContextUndefined,
    /// `match_node` on a query shape that cannot be inverted into a pattern.
    InvalidPattern,
    /// Operand value not usable where it was requested (e.g. a scalar fed
    /// into a set operation, or `advance` on a boolean expression).
    TypeError,
    /// A merge observed input that was not in ascending document order.
    OrderingViolation,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ContextUndefined => "XPC0001",
            ErrorCode::InvalidPattern => "XPC0002",
            ErrorCode::TypeError => "XPC0003",
            ErrorCode::OrderingViolation => "XPC0004",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error: {message} ({code})")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into() }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub(crate) fn context_undefined(what: &str) -> Self {
        Self::from_code(ErrorCode::ContextUndefined, format!("{what} advanced before evaluate()"))
    }

    pub(crate) fn invalid_pattern(what: &str) -> Self {
        tracing::debug!(shape = what, "pattern rejected");
        Self::from_code(ErrorCode::InvalidPattern, format!("{what} cannot be used as a match pattern"))
    }

    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::TypeError, msg)
    }

    pub(crate) fn ordering_violation(msg: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::OrderingViolation, msg)
    }
}
