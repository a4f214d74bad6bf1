pub use super::model::{LogRecord, ParseError};

pub trait LineParser: Send + Sync {
    /// parse one raw log line, without its terminator, into a record
    fn parse(&self, raw: &[u8]) -> Result<LogRecord, ParseError>;
}
