//! Parsing and streaming decoding of classic load balancer access logs.
//!
//! Each log line is sixteen space-separated fields, some of them quoted.
//! [`parse_line`] turns one line into a [`LogRecord`]; [`Decoder`] and
//! [`AsyncDecoder`] walk a whole source line by line, isolating malformed
//! lines so one bad entry never ends the session.

pub mod conf;
pub mod decoder;
pub mod parser;

pub use conf::{ConfigError, DecoderConfig};
pub use decoder::{AsyncDecoder, DecodeError, Decoder, RecordStream, State};
pub use parser::{
    parse_line, DecodeMetrics, ElbLogParser, Field, LineParser, LogRecord, MetricsSnapshot,
    ParseError, QuotePolicy,
};
