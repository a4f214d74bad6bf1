//! Line-at-a-time decoding of access logs from a byte source.
//!
//! A decoder owns its source and walks it one `\n`-terminated line at a
//! time. Callers alternate `has_more` and `decode_next`; a line that fails
//! to parse is reported with its line number and the decoder moves on.
//!
//! - `reader.rs`: blocking `Decoder` over any `BufRead`, also an `Iterator`
//! - `stream.rs`: `AsyncDecoder` over `AsyncBufRead`, also a `Stream`
//! - `session.rs`: line numbering, terminator handling, metrics and events

pub mod error;
pub mod reader;
pub mod stream;
mod session;

pub use error::DecodeError;
pub use reader::Decoder;
pub use session::State;
pub use stream::{AsyncDecoder, RecordStream};
