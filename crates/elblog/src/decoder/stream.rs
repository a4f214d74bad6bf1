use std::io::ErrorKind;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::Stream;

use crate::conf::DecoderConfig;
use crate::parser::{DecodeMetrics, ElbLogParser, LineParser, LogRecord};

use super::error::DecodeError;
use super::session::{Session, State};

/// Records decoded from an async source, in line order.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<LogRecord, DecodeError>> + Send>>;

/// Async counterpart of [`Decoder`](super::Decoder) for sockets and other
/// `AsyncBufRead` sources. Same protocol, same per-line error isolation.
pub struct AsyncDecoder<R, P = ElbLogParser> {
    reader: R,
    session: Session<P>,
}

impl<R: AsyncRead + Unpin> AsyncDecoder<BufReader<R>> {
    pub fn from_async_read(inner: R) -> Self {
        Self::from_async_read_with_config(inner, &DecoderConfig::default())
    }

    pub fn from_async_read_with_config(inner: R, config: &DecoderConfig) -> Self {
        let reader = BufReader::with_capacity(config.read_buffer_capacity, inner);
        Self::with_config(reader, config)
    }
}

impl<R: AsyncBufRead + Unpin> AsyncDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: &DecoderConfig) -> Self {
        let parser = ElbLogParser::with_quote_policy(config.unterminated_quote);
        Self::with_parser(reader, parser, config)
    }
}

impl<R: AsyncBufRead + Unpin, P: LineParser> AsyncDecoder<R, P> {
    pub fn with_parser(reader: R, parser: P, config: &DecoderConfig) -> Self {
        Self {
            reader,
            session: Session::new(parser, config),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DecodeMetrics>) -> Self {
        self.session.set_metrics(metrics);
        self
    }

    pub fn state(&self) -> State {
        self.session.state
    }

    pub fn line_number(&self) -> u64 {
        self.session.line_number()
    }

    pub fn parser(&self) -> &P {
        self.session.parser()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// True while another line can be read. Waits for data but does not
    /// consume it.
    pub async fn has_more(&mut self) -> bool {
        if self.session.state == State::Exhausted {
            return false;
        }
        if self.session.pending.is_some() {
            return true;
        }

        loop {
            match self.reader.fill_buf().await {
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
    pub async fn decode_next(&mut self) -> Result<LogRecord, DecodeError> {
        if self.session.state == State::Exhausted {
            return Err(DecodeError::Exhausted);
        }
        if let Some(err) = self.session.pending.take() {
            return Err(self.session.read_failed(err));
        }

        self.session.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.session.buf).await {
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

impl<R, P> AsyncDecoder<R, P>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    P: LineParser + 'static,
{
    /// Drive the decoder as a stream. Ends at end of input, or right after
    /// yielding a read failure.
    pub fn into_stream(self) -> RecordStream {
        let mut decoder = self;
        let stream = async_stream::stream! {
            while decoder.has_more().await {
                let item = decoder.decode_next().await;
                let fatal = matches!(item, Err(DecodeError::Read(_)));
                yield item;
                if fatal {
                    break;
                }
            }
        };
        Box::pin(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::elb::tests::{http_record, HTTPS_LINE, HTTP_LINE};
    use crate::parser::{ParseError, QuotePolicy};
    use std::io;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    fn line(s: &str) -> Vec<u8> {
        format!("{s}\n").into_bytes()
    }

    #[tokio::test]
    async fn test_protocol_over_async_reader() {
        let input = [line(HTTP_LINE), line(HTTPS_LINE)].concat();
        let mut decoder = AsyncDecoder::new(input.as_slice());

        let mut records = Vec::new();
        while decoder.has_more().await {
            records.push(decoder.decode_next().await.unwrap());
        }

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], http_record());
        assert_eq!(records[1].protocol, "https");
        assert_eq!(decoder.state(), State::Exhausted);
        assert!(matches!(decoder.decode_next().await, Err(DecodeError::Exhausted)));
    }

    #[tokio::test]
    async fn test_config_selects_quote_policy() {
        let config = DecoderConfig {
            unterminated_quote: QuotePolicy::TakeRest,
            ..DecoderConfig::default()
        };
        let mut decoder = AsyncDecoder::with_config(&b""[..], &config);
        assert_eq!(decoder.parser().quote_policy(), QuotePolicy::TakeRest);
        assert!(!decoder.has_more().await);
    }

    #[tokio::test]
    async fn test_line_split_across_reads() {
        let bytes = line(HTTP_LINE);
        let (head, tail) = bytes.split_at(40);
        let mock = tokio_test::io::Builder::new()
            .read(head)
            .wait(Duration::from_millis(5))
            .read(tail)
            .build();

        let mut decoder = AsyncDecoder::from_async_read(mock);
        assert!(decoder.has_more().await);
        assert_eq!(decoder.decode_next().await.unwrap(), http_record());
        assert!(!decoder.has_more().await);
    }

    #[tokio::test]
    async fn test_read_error_surfaced() {
        let mock = tokio_test::io::Builder::new()
            .read(&line(HTTP_LINE))
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let mut decoder = AsyncDecoder::from_async_read(mock);
        assert!(decoder.has_more().await);
        assert!(decoder.decode_next().await.is_ok());
        assert!(decoder.has_more().await);
        match decoder.decode_next().await {
            Err(DecodeError::Read(e)) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected read error, got {other:?}"),
        }
        assert_eq!(decoder.state(), State::Open);
    }

    #[tokio::test]
    async fn test_stream_preserves_order_and_isolates_errors() {
        let input = [line(HTTP_LINE), line("http garbage"), line(HTTPS_LINE)].concat();
        let results: Vec<_> = AsyncDecoder::new(std::io::Cursor::new(input))
            .into_stream()
            .collect()
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(DecodeError::Parse { line, source, .. }) => {
                assert_eq!(*line, 2);
                assert_eq!(*source, ParseError::Arity { expected: 16, found: 2 });
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert_eq!(results[2].as_ref().unwrap().ssl_cipher, "ECDHE-RSA-AES128-GCM-SHA256");
    }

    #[tokio::test]
    async fn test_stream_ends_after_read_error() {
        let mock = tokio_test::io::Builder::new()
            .read(&line(HTTP_LINE))
            .read_error(io::Error::other("boom"))
            .build();

        let results: Vec<_> = AsyncDecoder::from_async_read(mock)
            .into_stream()
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DecodeError::Read(_))));
    }

    #[tokio::test]
    async fn test_stream_of_many_identical_lines() {
        let n = 100;
        let input = line(HTTP_LINE).repeat(n);
        let metrics = Arc::new(DecodeMetrics::new());
        let results: Vec<_> = AsyncDecoder::new(std::io::Cursor::new(input))
            .with_metrics(Arc::clone(&metrics))
            .into_stream()
            .collect()
            .await;

        assert_eq!(results.len(), n);
        assert!(results.iter().all(|r| r.as_ref().unwrap() == &http_record()));
        assert_eq!(metrics.snapshot().records_decoded, n as u64);
    }
}
