//! Ergonomic byte-oriented constructors over the engines (spec.md §6
//! "Construction surface"), in the style of the `csv` crate's
//! `ReaderBuilder` — an options object rather than free functions.
//!
//! These wrap [`CsvEngine`]/[`TsvEngine`] with an [`ArenaPolicy`] for the
//! common case. Callers who need the wide (`char`) alphabet, a custom
//! buffer policy, or direct access to `run`'s resume protocol construct
//! the engines in `csv`/`tsv` directly instead.

use crate::buffer::{ArenaPolicy, DEFAULT_BUFFER_SIZE};
use crate::chars::{CsvKeyChars, TsvKeyChars};
use crate::csv::CsvEngine;
use crate::engine::{Engine, RunResult};
use crate::error::{format_text_error, ParseError};
use crate::handler::Handler;
use crate::input::{CharInput, ReadInput, SliceInput};
use crate::tsv::TsvEngine;

/// Builds a [`CsvParser`]. `.quote` is the only tunable delimiter-ish
/// knob — CSV's field separator is fixed at comma per RFC 4180; a
/// differently-delimited format is exactly [`TsvParserBuilder`]'s job.
#[derive(Debug, Clone, Copy)]
pub struct CsvParserBuilder {
    buffer_size: usize,
    quote: u8,
    base: usize,
}

impl Default for CsvParserBuilder {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE, quote: b'"', base: 1 }
    }
}

impl CsvParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }

    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// The line/column base used by [`CsvParser::describe_error`] (spec.md
    /// §7: default 1, so the first line is reported as "line 1").
    pub fn base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn build<I, H>(self, input: I, handler: H) -> CsvParser<I, H>
    where
        I: CharInput<u8>,
        H: Handler<u8>,
    {
        let engine =
            CsvEngine::new(input, handler, ArenaPolicy::new(self.buffer_size), CsvKeyChars::new(self.quote));
        CsvParser { engine, base: self.base }
    }

    pub fn from_slice<H: Handler<u8>>(self, data: &[u8], handler: H) -> CsvParser<SliceInput<'_>, H> {
        self.build(SliceInput::new(data), handler)
    }

    pub fn from_reader<R: std::io::Read, H: Handler<u8>>(self, reader: R, handler: H) -> CsvParser<ReadInput<R>, H> {
        self.build(ReadInput::new(reader), handler)
    }
}

/// A ready-to-run CSV engine plus the error-rendering base configured on
/// its builder.
pub struct CsvParser<I, H> {
    engine: CsvEngine<u8, I, H, ArenaPolicy<u8>>,
    base: usize,
}

impl<I: CharInput<u8>, H: Handler<u8>> CsvParser<I, H> {
    pub fn builder() -> CsvParserBuilder {
        CsvParserBuilder::new()
    }

    pub fn run(&mut self) -> Result<RunResult, ParseError> {
        self.engine.run()
    }

    pub fn handler(&self) -> &H {
        Engine::handler(&self.engine)
    }

    pub fn handler_mut(&mut self) -> &mut H {
        Engine::handler_mut(&mut self.engine)
    }

    pub fn into_handler(self) -> H {
        Engine::into_handler(self.engine)
    }

    /// Renders `error` at this parser's configured line/column base
    /// (spec.md §6 wire format), rather than `Display`'s fixed base of 1.
    pub fn describe_error(&self, error: &ParseError) -> String {
        format_text_error(&error.message(), error.position(), self.base)
    }
}

/// Builds a [`TsvParser`]. `.delimiter` defaults to tab.
#[derive(Debug, Clone, Copy)]
pub struct TsvParserBuilder {
    buffer_size: usize,
    delimiter: u8,
    base: usize,
}

impl Default for TsvParserBuilder {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE, delimiter: b'\t', base: 1 }
    }
}

impl TsvParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn build<I, H>(self, input: I, handler: H) -> TsvParser<I, H>
    where
        I: CharInput<u8>,
        H: Handler<u8>,
    {
        let engine = TsvEngine::new(
            input,
            handler,
            ArenaPolicy::new(self.buffer_size),
            TsvKeyChars::new(self.delimiter),
        );
        TsvParser { engine, base: self.base }
    }

    pub fn from_slice<H: Handler<u8>>(self, data: &[u8], handler: H) -> TsvParser<SliceInput<'_>, H> {
        self.build(SliceInput::new(data), handler)
    }

    pub fn from_reader<R: std::io::Read, H: Handler<u8>>(self, reader: R, handler: H) -> TsvParser<ReadInput<R>, H> {
        self.build(ReadInput::new(reader), handler)
    }
}

pub struct TsvParser<I, H> {
    engine: TsvEngine<u8, I, H, ArenaPolicy<u8>>,
    base: usize,
}

impl<I: CharInput<u8>, H: Handler<u8>> TsvParser<I, H> {
    pub fn builder() -> TsvParserBuilder {
        TsvParserBuilder::new()
    }

    pub fn run(&mut self) -> Result<RunResult, ParseError> {
        self.engine.run()
    }

    pub fn handler(&self) -> &H {
        Engine::handler(&self.engine)
    }

    pub fn handler_mut(&mut self) -> &mut H {
        Engine::handler_mut(&mut self.engine)
    }

    pub fn into_handler(self) -> H {
        Engine::into_handler(self.engine)
    }

    pub fn describe_error(&self, error: &ParseError) -> String {
        format_text_error(&error.message(), error.position(), self.base)
    }
}
