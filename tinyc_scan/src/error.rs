use thiserror::Error;

/// Scan-time failures. Both are fatal per the source language's error policy:
/// the caller is expected to print the message and terminate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unrecognized token")]
    UnrecognizedToken { line: usize },

    #[error("unterminated string")]
    UnterminatedString { line: usize },
}

impl ScanError {
    /// The offending source line, for callers that render `Line L: <message>`.
    pub fn line(&self) -> usize {
        match self {
            ScanError::UnrecognizedToken { line } | ScanError::UnterminatedString { line } => *line,
        }
    }
}
