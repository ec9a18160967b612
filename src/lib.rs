//! A streaming CSV/TSV parsing engine with push, pull, and typed
//! table-scanner interfaces.
//!
//! The parse engine ([`csv`], [`tsv`]) drives a [`handler::Handler`] with
//! field and record boundaries as it consumes a [`input::CharInput`]
//! through a [`buffer::BufferPolicy`]-supplied working buffer, suspending
//! cooperatively at well-defined points rather than blocking
//! (`engine::ResumePoint`). Three layers build on that push interface:
//!
//! - [`pull`] turns push events into a drainable queue, for callers that
//!   want to pull one primitive event or one field at a time.
//! - [`translate`] converts a field's raw code units into typed values
//!   (integers, floats, owned or borrowed text), with configurable
//!   skip/error-recovery policies.
//! - [`scanner`] dispatches finalized fields to per-column scanners with
//!   an optional header phase, and [`scanner::extractor`] filters whole
//!   records by a header-name/field-value predicate.
//! - [`stored`] owns parsed field bytes in an arena-backed table built
//!   directly from parse events, independent of any of the above.
//!
//! [`parser`] wraps the byte-oriented CSV/TSV engines in a `csv`-crate-style
//! builder for the common case of parsing a slice or a [`std::io::Read`].

pub mod buffer;
pub mod chars;
pub mod csv;
pub mod engine;
pub mod error;
pub mod handler;
pub mod input;
pub mod parser;
pub mod pull;
pub mod scanner;
pub mod stored;
pub mod translate;
pub mod tsv;

pub use chars::{CodeUnit, CsvKeyChars, KeyChars, TsvKeyChars};
pub use csv::CsvEngine;
pub use engine::{Engine, RunResult};
pub use error::{ParseError, Sign, TextPosition};
pub use handler::{BufferOwner, Control, Handler, YieldLocation};
pub use input::{CharInput, ReadInput, SliceInput, WideSliceInput};
pub use parser::{CsvParser, CsvParserBuilder, TsvParser, TsvParserBuilder};
pub use tsv::TsvEngine;
