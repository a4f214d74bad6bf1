use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::sync::Arc;

use crate::conf::DecoderConfig;
use crate::parser::{DecodeMetrics, ElbLogParser, LineParser, LogRecord};

use super::error::DecodeError;
use super::session::{Session, State};

/// Blocking decoder over a buffered byte source.
///
/// Protocol: call [`has_more`](Self::has_more); while it returns true, call
/// [`decode_next`](Self::decode_next) once. Each call consumes exactly one
/// line. A parse error affects only its own line; decoding may continue.
///
/// ```
/// use elblog::Decoder;
///
/// let input = "http 2015-05-13T23:39:43.945958Z my-loadbalancer 192.168.131.39:2817 10.0.0.1:80 0.000073 0.001048 0.000057 200 200 0 29 \"GET http://www.example.com:80/ HTTP/1.1\" \"curl/7.38.0\" - -\n";
/// let mut decoder = Decoder::new(input.as_bytes());
/// while decoder.has_more() {
///     let record = decoder.decode_next()?;
///     assert_eq!(record.sent_bytes, 29);
/// }
/// # Ok::<(), elblog::DecodeError>(())
/// ```
pub struct Decoder<R, P = ElbLogParser> {
    reader: R,
    session: Session<P>,
    /// Set once the iterator has yielded a read failure
    fused: bool,
}

impl<R: Read> Decoder<BufReader<R>> {
    /// Wrap an unbuffered source.
    pub fn from_read(inner: R) -> Self {
        Self::from_read_with_config(inner, &DecoderConfig::default())
    }

    pub fn from_read_with_config(inner: R, config: &DecoderConfig) -> Self {
        let reader = BufReader::with_capacity(config.read_buffer_capacity, inner);
        Self::with_config(reader, config)
    }
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: &DecoderConfig) -> Self {
        let parser = ElbLogParser::with_quote_policy(config.unterminated_quote);
        Self::with_parser(reader, parser, config)
    }
}

impl<R: BufRead, P: LineParser> Decoder<R, P> {
    pub fn with_parser(reader: R, parser: P, config: &DecoderConfig) -> Self {
        Self {
            reader,
            session: Session::new(parser, config),
            fused: false,
        }
    }

    /// Record into shared counters.
    pub fn with_metrics(mut self, metrics: Arc<DecodeMetrics>) -> Self {
        self.session.set_metrics(metrics);
        self
    }

    pub fn state(&self) -> State {
        self.session.state
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> u64 {
        self.session.line_number()
    }

    pub fn parser(&self) -> &P {
        self.session.parser()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// True while another line can be read. Does not consume input.
    ///
    /// A read failure here is held back and returned by the next
    /// `decode_next`, so this reports true for it.
    pub fn has_more(&mut self) -> bool {
        if self.session.state == State::Exhausted {
            return false;
        }
        if self.session.pending.is_some() {
            return true;
        }

        loop {
            match self.reader.fill_buf() {
                Ok(available) if available.is_empty() => {
                    self.session.end_of_input();
                    return false;
                }
                Ok(_) => return true,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.session.pending = Some(e);
                    return true;
                }
            }
        }
    }

    /// Consume one line and parse it.
    ///
    /// Fails with [`DecodeError::Exhausted`] once the source has ended.
    pub fn decode_next(&mut self) -> Result<LogRecord, DecodeError> {
        if self.session.state == State::Exhausted {
            return Err(DecodeError::Exhausted);
        }
        if let Some(err) = self.session.pending.take() {
            return Err(self.session.read_failed(err));
        }

        self.session.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.session.buf) {
            Ok(read) => read,
            Err(e) => return Err(self.session.read_failed(e)),
        };
        if read == 0 {
            self.session.end_of_input();
            return Err(DecodeError::Exhausted);
        }

        self.session.decode_buffered(read)
    }
}

/// Yields every line's result in order. Stops at end of input, or right
/// after yielding a read failure.
impl<R: BufRead, P: LineParser> Iterator for Decoder<R, P> {
    type Item = Result<LogRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused || !self.has_more() {
            return None;
        }
        let item = self.decode_next();
        if matches!(item, Err(DecodeError::Read(_))) {
            self.fused = true;
        }
        Some(item)
    }
}
