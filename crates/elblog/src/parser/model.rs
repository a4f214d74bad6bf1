use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::serde_utils::{deserialize_duration_secs, serialize_duration_secs};

/// Positional fields of an access log line, in the order they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    #[serde(rename = "type")]
    Protocol,
    Timestamp,
    Name,
    Client,
    Backend,
    RequestProcessingTime,
    BackendProcessingTime,
    ResponseProcessingTime,
    ElbStatusCode,
    BackendStatusCode,
    ReceivedBytes,
    SentBytes,
    Request,
    UserAgent,
    SslCipher,
    SslProtocol,
}

impl Field {
    /// Every field, in line order. The length is the arity of a line.
    pub const ALL: [Field; 16] = [
        Field::Protocol,
        Field::Timestamp,
        Field::Name,
        Field::Client,
        Field::Backend,
        Field::RequestProcessingTime,
        Field::BackendProcessingTime,
        Field::ResponseProcessingTime,
        Field::ElbStatusCode,
        Field::BackendStatusCode,
        Field::ReceivedBytes,
        Field::SentBytes,
        Field::Request,
        Field::UserAgent,
        Field::SslCipher,
        Field::SslProtocol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Protocol => "type",
            Field::Timestamp => "timestamp",
            Field::Name => "name",
            Field::Client => "client",
            Field::Backend => "backend",
            Field::RequestProcessingTime => "request_processing_time",
            Field::BackendProcessingTime => "backend_processing_time",
            Field::ResponseProcessingTime => "response_processing_time",
            Field::ElbStatusCode => "elb_status_code",
            Field::BackendStatusCode => "backend_status_code",
            Field::ReceivedBytes => "received_bytes",
            Field::SentBytes => "sent_bytes",
            Field::Request => "request",
            Field::UserAgent => "user_agent",
            Field::SslCipher => "ssl_cipher",
            Field::SslProtocol => "ssl_protocol",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of tokens every line must produce.
pub const FIELD_COUNT: usize = Field::ALL.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("invalid {field} {raw:?}: {reason}")]
    FieldFormat {
        field: Field,
        raw: String,
        reason: String,
    },

    #[error("unterminated quoted field starting at byte {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("Non-UTF8 content")]
    NonUtf8,
}

impl ParseError {
    pub(crate) fn field(field: Field, raw: &str, reason: impl fmt::Display) -> Self {
        ParseError::FieldFormat {
            field,
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The field that failed to convert, if this is a field-level error.
    pub fn failed_field(&self) -> Option<Field> {
        match self {
            ParseError::FieldFormat { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// One decoded access log entry.
///
/// Placeholder values (`-`) in the string fields are kept verbatim. Only the
/// address fields map the placeholder to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Listener protocol label (`http`, `https`, `tcp`, ...)
    #[serde(rename = "type")]
    pub protocol: String,

    /// Time the load balancer received the request, UTC
    pub timestamp: DateTime<Utc>,

    /// Load balancer name
    pub name: String,

    pub client: Option<SocketAddr>,

    /// `None` when no backend served the request
    pub backend: Option<SocketAddr>,

    #[serde(
        serialize_with = "serialize_duration_secs",
        deserialize_with = "deserialize_duration_secs"
    )]
    pub request_processing_time: Duration,

    #[serde(
        serialize_with = "serialize_duration_secs",
        deserialize_with = "deserialize_duration_secs"
    )]
    pub backend_processing_time: Duration,

    #[serde(
        serialize_with = "serialize_duration_secs",
        deserialize_with = "deserialize_duration_secs"
    )]
    pub response_processing_time: Duration,

    pub elb_status_code: u32,
    pub backend_status_code: u32,
    pub received_bytes: u64,
    pub sent_bytes: u64,

    /// Request line with the surrounding quotes removed
    pub request: String,
    pub user_agent: String,
    pub ssl_cipher: String,
    pub ssl_protocol: String,
}

impl FromStr for LogRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parse_line(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_matches_arity() {
        assert_eq!(FIELD_COUNT, 16);
        assert_eq!(Field::ALL[0], Field::Protocol);
        assert_eq!(Field::ALL[12], Field::Request);
        assert_eq!(Field::ALL[15], Field::SslProtocol);
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::Client.to_string(), "client");
        assert_eq!(Field::Protocol.to_string(), "type");
    }

    #[test]
    fn test_error_messages_name_field_and_raw_value() {
        let err = ParseError::field(Field::Backend, "10.0.0.1:http", "invalid port");
        assert_eq!(err.to_string(), r#"invalid backend "10.0.0.1:http": invalid port"#);
        assert_eq!(err.failed_field(), Some(Field::Backend));

        let err = ParseError::Arity { expected: 16, found: 3 };
        assert_eq!(err.to_string(), "expected 16 fields, found 3");
        assert_eq!(err.failed_field(), None);
    }
}
