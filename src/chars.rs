//! The code unit alphabet and the five key characters the engine recognizes.
//!
//! Ported from `original_source/include/commata/key_chars.hpp`: the engine
//! is monomorphized on a single character type `Ch`, and a small trait
//! supplies the comma/tab, quote, CR, and LF values for that type. Both a
//! narrow (`u8`) and wide (`char`) alphabet are supported.

use std::borrow::Cow;

use crate::error::{ParseError, TextPosition};

/// A code unit the engine can scan. Implemented for `u8` (narrow, byte-
/// oriented text) and `char` (wide, full Unicode scalar values).
pub trait CodeUnit: Copy + Eq + std::fmt::Debug + 'static {
    /// A null unit, used as the sentinel written just past a stored value.
    const NUL: Self;
}

impl CodeUnit for u8 {
    const NUL: Self = 0;
}

impl CodeUnit for char {
    const NUL: Self = '\0';
}

/// Supplies the key characters an engine transition table switches on, for
/// a particular code unit type and delimiter choice.
pub trait KeyChars<Ch: CodeUnit>: Copy {
    fn delimiter(&self) -> Ch;
    fn quote(&self) -> Ch;
    fn cr(&self) -> Ch;
    fn lf(&self) -> Ch;
}

/// CSV key characters: comma-delimited (fixed — RFC 4180 leaves no room to
/// vary it; a differently-delimited "CSV" is exactly [`TsvKeyChars`]'s use
/// case), with a configurable quote character.
#[derive(Debug, Clone, Copy)]
pub struct CsvKeyChars {
    quote: u8,
}

impl Default for CsvKeyChars {
    fn default() -> Self {
        Self { quote: b'"' }
    }
}

impl CsvKeyChars {
    pub fn new(quote: u8) -> Self {
        Self { quote }
    }
}

impl KeyChars<u8> for CsvKeyChars {
    fn delimiter(&self) -> u8 {
        b','
    }
    fn quote(&self) -> u8 {
        self.quote
    }
    fn cr(&self) -> u8 {
        b'\r'
    }
    fn lf(&self) -> u8 {
        b'\n'
    }
}

impl KeyChars<char> for CsvKeyChars {
    fn delimiter(&self) -> char {
        ','
    }
    fn quote(&self) -> char {
        self.quote as char
    }
    fn cr(&self) -> char {
        '\r'
    }
    fn lf(&self) -> char {
        '\n'
    }
}

/// TSV key characters: the delimiter is configurable (tab by default) and
/// there is no quoting, per spec.md §1 Non-goal (iv).
#[derive(Debug, Clone, Copy)]
pub struct TsvKeyChars<Ch> {
    delimiter: Ch,
}

impl Default for TsvKeyChars<u8> {
    fn default() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl Default for TsvKeyChars<char> {
    fn default() -> Self {
        Self { delimiter: '\t' }
    }
}

impl<Ch: CodeUnit> TsvKeyChars<Ch> {
    pub fn new(delimiter: Ch) -> Self {
        Self { delimiter }
    }
}

impl KeyChars<u8> for TsvKeyChars<u8> {
    fn delimiter(&self) -> u8 {
        self.delimiter
    }
    fn quote(&self) -> u8 {
        0 // unused: TSV has no quoting
    }
    fn cr(&self) -> u8 {
        b'\r'
    }
    fn lf(&self) -> u8 {
        b'\n'
    }
}

impl KeyChars<char> for TsvKeyChars<char> {
    fn delimiter(&self) -> char {
        self.delimiter
    }
    fn quote(&self) -> char {
        '\0'
    }
    fn cr(&self) -> char {
        '\r'
    }
    fn lf(&self) -> char {
        '\n'
    }
}

/// Decodes a code-unit slice to text, for the translators in
/// [`crate::translate`]. Narrow text is validated as UTF-8 and borrowed;
/// wide text is always collected into an owned `String` since a `char`
/// slice has no contiguous `str` representation.
pub trait DecodeText: CodeUnit {
    fn decode(slice: &[Self]) -> Result<Cow<'_, str>, ParseError>;
}

impl DecodeText for u8 {
    fn decode(slice: &[u8]) -> Result<Cow<'_, str>, ParseError> {
        std::str::from_utf8(slice).map(Cow::Borrowed).map_err(|_| ParseError::InvalidFormat {
            message: "field is not valid UTF-8".to_string(),
            position: TextPosition::ABSENT,
        })
    }
}

impl DecodeText for char {
    fn decode(slice: &[char]) -> Result<Cow<'_, str>, ParseError> {
        Ok(Cow::Owned(slice.iter().collect()))
    }
}
