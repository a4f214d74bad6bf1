use crate::parser::fields::{parse_address, parse_duration, parse_integer, parse_timestamp};
use crate::parser::model::{Field, FIELD_COUNT};
use crate::parser::tokenize::{tokenize, QuotePolicy};
use crate::parser::traits::{LineParser, LogRecord, ParseError};

/// Parser for classic load balancer access log lines.
///
/// Format (space separated, request and user agent quoted):
///
/// ```text
/// type timestamp name client:port backend:port request_processing_time
/// backend_processing_time response_processing_time elb_status_code
/// backend_status_code received_bytes sent_bytes "request" "user_agent"
/// ssl_cipher ssl_protocol
/// ```
///
/// The parser holds no state between calls and can be shared freely
/// across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElbLogParser {
    quote_policy: QuotePolicy,
}

impl ElbLogParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote_policy(quote_policy: QuotePolicy) -> Self {
        Self { quote_policy }
    }

    pub fn quote_policy(&self) -> QuotePolicy {
        self.quote_policy
    }

    /// Parse a line that is already known to be valid UTF-8.
    pub fn parse_str(&self, line: &str) -> Result<LogRecord, ParseError> {
        let tokens = tokenize(line, self.quote_policy)?;

        let &[
            protocol,
            timestamp,
            name,
            client,
            backend,
            request_time,
            backend_time,
            response_time,
            elb_status,
            backend_status,
            received,
            sent,
            request,
            user_agent,
            ssl_cipher,
            ssl_protocol,
        ] = tokens.as_slice()
        else {
            return Err(ParseError::Arity {
                expected: FIELD_COUNT,
                found: tokens.len(),
            });
        };

        Ok(LogRecord {
            protocol: protocol.to_string(),
            timestamp: parse_timestamp(timestamp)?,
            name: name.to_string(),
            client: parse_address(Field::Client, client)?,
            backend: parse_address(Field::Backend, backend)?,
            request_processing_time: parse_duration(Field::RequestProcessingTime, request_time)?,
            backend_processing_time: parse_duration(Field::BackendProcessingTime, backend_time)?,
            response_processing_time: parse_duration(Field::ResponseProcessingTime, response_time)?,
            elb_status_code: parse_integer(Field::ElbStatusCode, elb_status)?,
            backend_status_code: parse_integer(Field::BackendStatusCode, backend_status)?,
            received_bytes: parse_integer(Field::ReceivedBytes, received)?,
            sent_bytes: parse_integer(Field::SentBytes, sent)?,
            request: request.to_string(),
            user_agent: user_agent.to_string(),
            ssl_cipher: ssl_cipher.to_string(),
            ssl_protocol: ssl_protocol.to_string(),
        })
    }
}

impl LineParser for ElbLogParser {
    fn parse(&self, raw: &[u8]) -> Result<LogRecord, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|_| ParseError::NonUtf8)?;
        self.parse_str(text)
    }
}
