//! Typed conversions for individual tokens.
//!
//! Each conversion is independent and reports failures as
//! [`ParseError::FieldFormat`] carrying the field and the raw token.

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::model::{Field, ParseError};

/// Literal used by the log for "not applicable".
pub const PLACEHOLDER: &str = "-";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const NANOS_DIGITS: usize = 9;

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYY-MM-DDTHH:MM:SS.` with every digit present, then at least one
/// fractional digit. chrono alone accepts unpadded months and days.
fn has_fixed_width_layout(body: &str) -> bool {
    let bytes = body.as_bytes();
    bytes.len() > 20
        && bytes[..20].iter().enumerate().all(|(i, &b)| match i {
            4 | 7 => b == b'-',
            10 => b == b'T',
            13 | 16 => b == b':',
            19 => b == b'.',
            _ => b.is_ascii_digit(),
        })
}

/// Parse an ISO-8601 UTC instant with fractional seconds, e.g.
/// `2015-05-13T23:39:43.945958Z`.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let body = raw
        .strip_suffix('Z')
        .ok_or_else(|| ParseError::field(Field::Timestamp, raw, "missing 'Z' suffix"))?;
    if !has_fixed_width_layout(body) {
        return Err(ParseError::field(
            Field::Timestamp,
            raw,
            "expected YYYY-MM-DDTHH:MM:SS.fff",
        ));
    }

    NaiveDateTime::parse_from_str(body, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| ParseError::field(Field::Timestamp, raw, e))
}

/// Parse `ip:port`, splitting on the last colon. IPv6 hosts may be bare or
/// bracketed. The placeholder decodes to `None`.
pub fn parse_address(field: Field, raw: &str) -> Result<Option<SocketAddr>, ParseError> {
    if raw == PLACEHOLDER {
        return Ok(None);
    }

    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| ParseError::field(field, raw, "missing port"))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    let ip: IpAddr = host.parse().map_err(|e| ParseError::field(field, raw, e))?;
    if !is_digits(port) {
        return Err(ParseError::field(field, raw, "port is not a number"));
    }
    let port: u16 = port.parse().map_err(|e| ParseError::field(field, raw, e))?;

    Ok(Some(SocketAddr::new(ip, port)))
}

/// Parse decimal seconds (`0.000073`, `2`, `1.5`) into an exact [`Duration`].
///
/// The conversion is done on the digits, not through a float, so every
/// value the log can print is represented exactly down to the nanosecond.
/// Digits past the ninth fractional place are truncated.
pub fn parse_duration(field: Field, raw: &str) -> Result<Duration, ParseError> {
    if raw.starts_with('-') {
        return Err(ParseError::field(field, raw, "negative duration"));
    }

    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    if !is_digits(whole) {
        return Err(ParseError::field(field, raw, "expected decimal seconds"));
    }
    let secs: u64 = whole.parse().map_err(|e| ParseError::field(field, raw, e))?;

    let nanos = match fraction {
        None => 0,
        Some(fraction) => {
            if !is_digits(fraction) {
                return Err(ParseError::field(field, raw, "expected decimal seconds"));
            }
            let digits = &fraction[..fraction.len().min(NANOS_DIGITS)];
            let value: u32 = digits.parse().map_err(|e| ParseError::field(field, raw, e))?;
            value * 10u32.pow((NANOS_DIGITS - digits.len()) as u32)
        }
    };

    Ok(Duration::new(secs, nanos))
}

/// Parse a base-10 non-negative integer. No sign, no range check beyond `T`.
pub fn parse_integer<T>(field: Field, raw: &str) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: Display,
{
    if !is_digits(raw) {
        return Err(ParseError::field(field, raw, "expected a non-negative integer"));
    }
    raw.parse().map_err(|e| ParseError::field(field, raw, e))
}
