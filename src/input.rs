//! The character-input contract (spec.md §6) and a couple of concrete
//! adapters over it.
//!
//! The engine treats character input as an external collaborator: it only
//! needs something that can fill a caller-supplied block with up to `n`
//! code units and report how many it actually produced. `original_source`
//! expresses the same contract over `std::streambuf`/`FILE*`/memory
//! (`char_input.hpp`); we keep only the contract plus the two adapters a
//! caller actually needs to get going (a borrowed slice and a `Read`).

use crate::chars::CodeUnit;
use crate::error::ParseError;

/// Produces code units on demand. A `fill` call that returns fewer than
/// `out.len()` units signals end of stream; it need not be called again
/// after that (though doing so is harmless and must return 0).
pub trait CharInput<Ch: CodeUnit> {
    /// Writes up to `out.len()` code units into `out`, returning the number
    /// actually written. A return less than `out.len()` marks EOF.
    fn fill(&mut self, out: &mut [Ch]) -> Result<usize, ParseError>;
}

/// A `CharInput` over an in-memory byte slice. Used for `&str`/`&[u8]`
/// sources and in every test in this crate.
pub struct SliceInput<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceInput<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> CharInput<u8> for SliceInput<'a> {
    fn fill(&mut self, out: &mut [u8]) -> Result<usize, ParseError> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// A `CharInput` over a `char` slice, for the wide-character engine variant.
pub struct WideSliceInput<'a> {
    data: &'a [char],
    pos: usize,
}

impl<'a> WideSliceInput<'a> {
    pub fn new(data: &'a [char]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> CharInput<char> for WideSliceInput<'a> {
    fn fill(&mut self, out: &mut [char]) -> Result<usize, ParseError> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(out.len());
        out[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// A `CharInput` over any [`std::io::Read`], for file- and stream-backed
/// sources. Bytes are passed through verbatim; callers are responsible for
/// ensuring the stream is a valid encoding for however they interpret the
/// parsed fields downstream (the engine itself is encoding-agnostic on the
/// byte alphabet).
pub struct ReadInput<R> {
    reader: R,
}

impl<R: std::io::Read> ReadInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: std::io::Read> CharInput<u8> for ReadInput<R> {
    fn fill(&mut self, out: &mut [u8]) -> Result<usize, ParseError> {
        let mut total = 0;
        while total < out.len() {
            match self.reader.read(&mut out[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e)),
            }
        }
        Ok(total)
    }
}
