//! Decoder configuration and its error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::QuotePolicy;

pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Handling of a quoted field still open at end of line
    pub unterminated_quote: QuotePolicy,
    /// Drop a `\r` left in front of the `\n` terminator
    pub strip_carriage_return: bool,
    /// Initial size of the line buffer and of readers the decoder creates.
    /// Lines longer than this still decode; the buffer grows.
    pub read_buffer_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unterminated_quote: QuotePolicy::Reject,
            strip_carriage_return: true,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
