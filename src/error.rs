use sqlparser::parser::ParserError;

use crate::dialect::Dialect;

#[derive(Debug, Eq, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested operation is not defined for this dialect, e.g.
    /// fingerprinting a Postgres statement.
    #[error("engine type is not supported: {0}")]
    UnsupportedEngine(Dialect),
    /// The input left the scanner in an unresolved lexical state, or an
    /// internal consistency check failed while normalizing it.
    #[error("{0}")]
    MalformedInput(String),
    /// The upstream SQL parser rejected the statement; passed through
    /// unchanged.
    #[error("{0}")]
    ExtractionFailure(#[from] ParserError),
    /// A read from the caller-supplied streaming source failed.
    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
