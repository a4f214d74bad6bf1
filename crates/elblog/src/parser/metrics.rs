use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::ParseError;

/// Error categories for metrics recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricErrorType {
    /// Token count did not match the format
    Arity,
    /// A field failed its typed conversion
    FieldFormat,
    /// Quoted field left open at end of line
    UnterminatedQuote,
    /// Non-UTF8 content encountered
    NonUtf8,
    /// Reading from the underlying source failed
    Io,
}

impl From<&ParseError> for MetricErrorType {
    fn from(err: &ParseError) -> Self {
        match err {
            ParseError::Arity { .. } => MetricErrorType::Arity,
            ParseError::FieldFormat { .. } => MetricErrorType::FieldFormat,
            ParseError::UnterminatedQuote { .. } => MetricErrorType::UnterminatedQuote,
            ParseError::NonUtf8 => MetricErrorType::NonUtf8,
        }
    }
}

/// A wrapper that forces the wrapped data onto its own cache line(s).
///
/// Decoders running on different workers share one `DecodeMetrics`; keeping
/// each counter group on its own 64-byte line stops them from invalidating
/// each other's cache on every line.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Raw input counters (updated per line read)
#[derive(Debug, Default)]
pub struct InputMetrics {
    pub lines: AtomicU64,
    pub bytes: AtomicU64,
}

/// Successful decodes and the time spent parsing them
#[derive(Debug, Default)]
pub struct TotalMetrics {
    pub time_nanos: AtomicU64,
    pub count: AtomicU64,
}

/// Error counters by type
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub arity: AtomicU64,
    pub field_format: AtomicU64,
    pub unterminated_quote: AtomicU64,
    pub non_utf8: AtomicU64,
    pub io: AtomicU64,
}

/// Counters for decoding sessions.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` reads are not atomic
/// across fields, so totals may be momentarily out of step with each other.
#[derive(Debug, Default)]
pub struct DecodeMetrics {
    pub input: CacheAligned<InputMetrics>,
    pub totals: CacheAligned<TotalMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
}

impl DecodeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one line taken from the source, terminator included in `bytes`
    #[inline]
    pub fn record_line(&self, bytes: usize) {
        self.input.0.lines.fetch_add(1, Ordering::Relaxed);
        self.input.0.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record a successfully decoded record
    #[inline]
    pub fn record_parse(&self, time_nanos: u64) {
        self.totals.0.count.fetch_add(1, Ordering::Relaxed);
        self.totals.0.time_nanos.fetch_add(time_nanos, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self, error_type: MetricErrorType) {
        let counter = match error_type {
            MetricErrorType::Arity => &self.errors.0.arity,
            MetricErrorType::FieldFormat => &self.errors.0.field_format,
            MetricErrorType::UnterminatedQuote => &self.errors.0.unterminated_quote,
            MetricErrorType::NonUtf8 => &self.errors.0.non_utf8,
            MetricErrorType::Io => &self.errors.0.io,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let records_decoded = self.totals.0.count.load(Ordering::Relaxed);
        let total_time_ns = self.totals.0.time_nanos.load(Ordering::Relaxed);

        let arity_errors = self.errors.0.arity.load(Ordering::Relaxed);
        let field_errors = self.errors.0.field_format.load(Ordering::Relaxed);
        let quote_errors = self.errors.0.unterminated_quote.load(Ordering::Relaxed);
        let non_utf8_lines = self.errors.0.non_utf8.load(Ordering::Relaxed);

        let parse_errors = arity_errors + field_errors + quote_errors + non_utf8_lines;
        let total_attempts = records_decoded + parse_errors;

        MetricsSnapshot {
            lines_read: self.input.0.lines.load(Ordering::Relaxed),
            bytes_read: self.input.0.bytes.load(Ordering::Relaxed),

            records_decoded,
            avg_parse_time_us: if records_decoded > 0 {
                (total_time_ns as f64 / records_decoded as f64) / 1000.0
            } else {
                0.0
            },

            arity_errors,
            field_errors,
            quote_errors,
            non_utf8_lines,
            read_errors: self.errors.0.io.load(Ordering::Relaxed),
            success_rate: if total_attempts > 0 {
                records_decoded as f64 / total_attempts as f64
            } else {
                1.0
            },
        }
    }
}

/// A read-only snapshot of decode metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    // Input
    pub lines_read: u64,
    pub bytes_read: u64,

    // Performance
    pub records_decoded: u64,
    pub avg_parse_time_us: f64,

    // Errors
    pub arity_errors: u64,
    pub field_errors: u64,
    pub quote_errors: u64,
    pub non_utf8_lines: u64,
    pub read_errors: u64,
    /// Share of lines that decoded; read errors are not counted
    pub success_rate: f64,
}
