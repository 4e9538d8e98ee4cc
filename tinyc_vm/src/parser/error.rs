use thiserror::Error;

use tinyc_scan::ScanError;

/// All parse-time failures. Every variant carries the offending line; `line`
/// and `Display` are deliberately separate so a caller can render either
/// `Line L: <message>` (the CLI) or just `<message>` (tests).
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { line: usize, name: String },

    #[error("'{name}' is already declared in this scope")]
    Redeclaration { line: usize, name: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { line: usize, name: String },

    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArgumentCountMismatch {
        line: usize,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'return' used outside of a function")]
    ReturnOutsideFunction { line: usize },

    #[error("non-void function must return a value")]
    MissingReturnValue { line: usize },

    #[error("void function cannot return a value")]
    UnexpectedReturnValue { line: usize },

    #[error("native function '{name}' declared as {declared} but library exports {actual}")]
    NativeSignatureMismatch {
        line: usize,
        name: String,
        declared: String,
        actual: String,
    },

    #[error("'{text}' is not a valid numeric literal")]
    InvalidNumericLiteral { line: usize, text: String },
}

impl ParseError {
    /// The offending source line, for callers that want to render
    /// `Line L: <message>` themselves (the CLI binary does; library callers
    /// embedding the VM may prefer their own format).
    pub fn line(&self) -> usize {
        match self {
            ParseError::Scan(e) => e.line(),
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnknownIdentifier { line, .. }
            | ParseError::Redeclaration { line, .. }
            | ParseError::UnknownFunction { line, .. }
            | ParseError::ArgumentCountMismatch { line, .. }
            | ParseError::ReturnOutsideFunction { line }
            | ParseError::MissingReturnValue { line }
            | ParseError::UnexpectedReturnValue { line }
            | ParseError::NativeSignatureMismatch { line, .. }
            | ParseError::InvalidNumericLiteral { line, .. } => *line,
        }
    }
}
