use bytes::Bytes;
use thiserror::Error;

use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The source failed. Its position afterwards is undefined, so callers
    /// normally end the session here.
    #[error("Failed to read from source: {0}")]
    Read(#[from] std::io::Error),

    /// One line did not parse. Decoding can continue with the next line.
    #[error("line {line}: {source}")]
    Parse {
        /// 1-based position of the line in the source
        line: u64,
        /// The line as read, terminator removed
        raw: Bytes,
        #[source]
        source: ParseError,
    },

    #[error("Decoder is exhausted")]
    Exhausted,
}

impl DecodeError {
    /// True for per-line failures the caller may skip past.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::Parse { .. })
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            DecodeError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}
