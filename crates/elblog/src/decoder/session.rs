//! Per-decoder state shared by the blocking and async decoders.
//!
//! Both decoders read one line into `buf`, then hand it here; this is where
//! terminators are stripped, the parser runs, and metrics and events are
//! recorded.

use std::io;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::conf::DecoderConfig;
use crate::parser::metrics::MetricErrorType;
use crate::parser::{DecodeMetrics, LineParser, LogRecord};

use super::error::DecodeError;

/// Decoder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// More lines may exist
    Open,
    /// The source reported end of input
    Exhausted,
}

pub(crate) struct Session<P> {
    parser: P,
    pub(crate) buf: Vec<u8>,
    pub(crate) state: State,
    /// Read failure seen by `has_more`, handed out by the next `decode_next`
    pub(crate) pending: Option<io::Error>,
    line_number: u64,
    strip_carriage_return: bool,
    metrics: Option<Arc<DecodeMetrics>>,
}

impl<P: LineParser> Session<P> {
    pub(crate) fn new(parser: P, config: &DecoderConfig) -> Self {
        Self {
            parser,
            buf: Vec::with_capacity(config.read_buffer_capacity),
            state: State::Open,
            pending: None,
            line_number: 0,
            strip_carriage_return: config.strip_carriage_return,
            metrics: None,
        }
    }

    pub(crate) fn set_metrics(&mut self, metrics: Arc<DecodeMetrics>) {
        self.metrics = Some(metrics);
    }

    pub(crate) fn line_number(&self) -> u64 {
        self.line_number
    }

    pub(crate) fn parser(&self) -> &P {
        &self.parser
    }

    pub(crate) fn end_of_input(&mut self) {
        if self.state == State::Open {
            tracing::debug!(lines = self.line_number, "decoder: end of input");
        }
        self.state = State::Exhausted;
    }

    pub(crate) fn read_failed(&mut self, err: io::Error) -> DecodeError {
        tracing::warn!(
            line = self.line_number + 1,
            error = %err,
            "decoder: read from source failed"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_error(MetricErrorType::Io);
        }
        DecodeError::Read(err)
    }

    /// Parse the `read` bytes just placed in `buf`.
    pub(crate) fn decode_buffered(&mut self, read: usize) -> Result<LogRecord, DecodeError> {
        self.line_number += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_line(read);
        }

        let line = strip_terminator(&self.buf, self.strip_carriage_return);
        let started = Instant::now();

        match self.parser.parse(line) {
            Ok(record) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_parse(started.elapsed().as_nanos() as u64);
                }
                tracing::trace!(line = self.line_number, "decoder: decoded record");
                Ok(record)
            }
            Err(source) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_error(MetricErrorType::from(&source));
                }
                tracing::debug!(
                    line = self.line_number,
                    error = %source,
                    "decoder: malformed line"
                );
                Err(DecodeError::Parse {
                    line: self.line_number,
                    raw: Bytes::copy_from_slice(line),
                    source,
                })
            }
        }
    }
}

fn strip_terminator(line: &[u8], strip_carriage_return: bool) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    if strip_carriage_return {
        line.strip_suffix(b"\r").unwrap_or(line)
    } else {
        line
    }
}
