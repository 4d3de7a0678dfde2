//! M-3850 record decoding.
//!
//! The protocol follows a layered structure:
//! - `layout`: byte offsets and framing constants (source of truth)
//! - `reader`: safe byte access and ASCII field conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! The parser is pure and contains no I/O; byte sources and the stream
//! loop handle port access and framing. A record is 14 bytes: a 3-byte
//! mode tag, a 6-byte value field, a 4-byte unit field, and a carriage
//! return. The value field may carry the `0.L` over-range sentinel or, in
//! Logic mode, symbolic text instead of a number.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{Decoded, decode_record};
