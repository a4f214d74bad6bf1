//! Access log line parsing
//!
//! Turns one raw line into a typed [`LogRecord`] or a [`ParseError`] naming
//! what went wrong.
//!
//! # Architecture
//!
//! - `tokenize.rs`: quote-aware splitting into positional tokens
//! - `fields.rs`: independent typed conversions (timestamp, address, duration, integer)
//! - `elb.rs`: the 16-field line parser built from the two above
//! - `traits.rs`: `LineParser`, the seam the decoders are generic over
//! - `metrics.rs`: decode counters shared between decoders

pub mod traits;
pub mod model;
pub mod tokenize;
pub mod fields;
pub mod elb;
pub mod metrics;
mod serde_utils;

// Re-export commonly used types
pub use traits::LineParser;
pub use model::{Field, LogRecord, ParseError, FIELD_COUNT};
pub use tokenize::QuotePolicy;
pub use elb::ElbLogParser;
pub use metrics::{DecodeMetrics, MetricsSnapshot};

/// Parse one line with the default parser.
pub fn parse_line(raw: &[u8]) -> Result<LogRecord, ParseError> {
    ElbLogParser::new().parse(raw)
}
