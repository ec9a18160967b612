//! Field translators: per-column conversion from raw characters to a typed
//! value, with configurable handling of missing fields and malformed
//! input (spec.md §4.6).

use std::num::IntErrorKind;

use crate::chars::{CodeUnit, DecodeText};
use crate::error::{ParseError, Sign, TextPosition};

/// What to do when a column's scanner never saw a field this record
/// (spec.md §4.6 "skipping handlers").
pub enum SkipHandling<T> {
    /// Raise `FieldNotFound`.
    FailIfSkipped,
    /// Silently produce no value; the sink is not invoked.
    IgnoreIfSkipped,
    /// Supply a fixed substitute value.
    ReplaceIfSkipped(T),
}

/// What to do when raw-to-`T` conversion fails (spec.md §4.6 "conversion
/// error handlers").
pub enum ConversionErrorHandling<T> {
    /// Propagate the underlying error (`Empty`, `InvalidFormat`, or
    /// `OutOfRange`).
    FailIfConversionFailed,
    /// Silently produce no value.
    IgnoreIfConversionFailed,
    /// Supply a substitute value per failure kind; `None` falls through to
    /// failing for that kind.
    ReplaceIfConversionFailed { empty: Option<T>, invalid: Option<T>, overflow_high: Option<T>, overflow_low: Option<T> },
}

/// The outcome of translating one field: either a value reached the sink,
/// or the field was legitimately skipped with no value produced.
pub enum Translated<T> {
    Value(T),
    NoValue,
}

/// Common interface over the translators below, letting a single
/// [`crate::scanner::TranslatingFieldScanner`] adapter drive any of them
/// without matching on the concrete type (spec.md §4.5/§4.6: the table
/// scanner's columns and the translators are one typed scanning layer, not
/// two disconnected ones).
///
/// [`ViewTranslator`] does not implement this trait: its value borrows
/// from the field slice it was given, but
/// [`FieldScanner::field_value`](crate::scanner::FieldScanner::field_value)
/// owns that slice only for the duration of the call, so there is nowhere
/// for a borrowed view to live once dispatch returns.
pub trait FieldTranslator<Ch> {
    type Value;

    fn translate(&self, field: &[Ch]) -> Result<Translated<Self::Value>, ParseError>;
    fn skipped(&self) -> Result<Translated<Self::Value>, ParseError>;
}

fn apply_skip<T>(handling: &SkipHandling<T>) -> Result<Translated<T>, ParseError>
where
    T: Clone,
{
    match handling {
        SkipHandling::FailIfSkipped => {
            Err(ParseError::FieldNotFound { name: None, position: TextPosition::ABSENT })
        }
        SkipHandling::IgnoreIfSkipped => Ok(Translated::NoValue),
        SkipHandling::ReplaceIfSkipped(v) => Ok(Translated::Value(v.clone())),
    }
}

fn apply_conversion_error<T>(
    handling: &ConversionErrorHandling<T>,
    error: ParseError,
) -> Result<Translated<T>, ParseError>
where
    T: Clone,
{
    match handling {
        ConversionErrorHandling::FailIfConversionFailed => Err(error),
        ConversionErrorHandling::IgnoreIfConversionFailed => Ok(Translated::NoValue),
        ConversionErrorHandling::ReplaceIfConversionFailed { empty, invalid, overflow_high, overflow_low } => {
            let substitute = match &error {
                ParseError::Empty { .. } => empty,
                ParseError::InvalidFormat { .. } => invalid,
                ParseError::OutOfRange { sign: Sign::Positive, .. } => overflow_high,
                ParseError::OutOfRange { .. } => overflow_low,
                _ => &None,
            };
            match substitute {
                Some(v) => Ok(Translated::Value(v.clone())),
                None => Err(error),
            }
        }
    }
}

/// A type `T` parseable from its canonical decimal text, with the raw
/// conversion rules spec.md §4.6 describes (leading whitespace skipped,
/// empty/blank is `Empty`, overflow is `OutOfRange` with a sign, anything
/// else is `InvalidFormat`).
pub trait RawConvert: Sized + Clone {
    fn raw_convert(text: &str) -> Result<Self, ParseError>;
}

macro_rules! impl_raw_convert_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl RawConvert for $t {
                fn raw_convert(text: &str) -> Result<Self, ParseError> {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        return Err(ParseError::Empty { position: TextPosition::ABSENT });
                    }
                    trimmed.parse::<$t>().map_err(|e| match e.kind() {
                        IntErrorKind::PosOverflow => ParseError::OutOfRange {
                            sign: Sign::Positive,
                            message: "value too large for target integer type".to_string(),
                            position: TextPosition::ABSENT,
                        },
                        IntErrorKind::NegOverflow => ParseError::OutOfRange {
                            sign: Sign::Negative,
                            message: "value too small for target integer type".to_string(),
                            position: TextPosition::ABSENT,
                        },
                        _ => ParseError::InvalidFormat {
                            message: "not a valid integer".to_string(),
                            position: TextPosition::ABSENT,
                        },
                    })
                }
            }
        )*
    };
}

impl_raw_convert_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_raw_convert_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl RawConvert for $t {
                fn raw_convert(text: &str) -> Result<Self, ParseError> {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        return Err(ParseError::Empty { position: TextPosition::ABSENT });
                    }
                    trimmed.parse::<$t>().map_err(|_| ParseError::InvalidFormat {
                        message: "not a valid floating-point number".to_string(),
                        position: TextPosition::ABSENT,
                    })
                }
            }
        )*
    };
}

impl_raw_convert_float!(f32, f64);

/// Translates a raw field into `T` via [`RawConvert`], applying the
/// skipping and conversion-error handlers (spec.md §4.6 "arithmetic
/// translator").
pub struct ArithmeticTranslator<Ch, T> {
    skip: SkipHandling<T>,
    on_error: ConversionErrorHandling<T>,
    _ch: std::marker::PhantomData<Ch>,
}

impl<Ch, T> ArithmeticTranslator<Ch, T>
where
    Ch: CodeUnit + DecodeText,
    T: RawConvert,
{
    pub fn new(skip: SkipHandling<T>, on_error: ConversionErrorHandling<T>) -> Self {
        Self { skip, on_error, _ch: std::marker::PhantomData }
    }

    pub fn translate(&self, field: &[Ch]) -> Result<Translated<T>, ParseError> {
        let text = Ch::decode(field)?;
        match T::raw_convert(&text) {
            Ok(v) => Ok(Translated::Value(v)),
            Err(e) => apply_conversion_error(&self.on_error, e),
        }
    }

    pub fn skipped(&self) -> Result<Translated<T>, ParseError> {
        apply_skip(&self.skip)
    }
}

impl<Ch, T> FieldTranslator<Ch> for ArithmeticTranslator<Ch, T>
where
    Ch: CodeUnit + DecodeText,
    T: RawConvert,
{
    type Value = T;

    fn translate(&self, field: &[Ch]) -> Result<Translated<T>, ParseError> {
        ArithmeticTranslator::translate(self, field)
    }

    fn skipped(&self) -> Result<Translated<T>, ParseError> {
        ArithmeticTranslator::skipped(self)
    }
}

/// Rewrites a field's locale-specific thousands separator and decimal
/// point to the C locale's before delegating to an [`ArithmeticTranslator`]
/// (spec.md §4.6 "locale-based arithmetic translator").
pub struct LocaleArithmeticTranslator<Ch, T> {
    thousands_separator: Option<char>,
    decimal_point: char,
    inner: ArithmeticTranslator<Ch, T>,
}

impl<Ch, T> LocaleArithmeticTranslator<Ch, T>
where
    Ch: CodeUnit + DecodeText,
    T: RawConvert,
{
    pub fn new(
        thousands_separator: Option<char>,
        decimal_point: char,
        skip: SkipHandling<T>,
        on_error: ConversionErrorHandling<T>,
    ) -> Self {
        Self { thousands_separator, decimal_point, inner: ArithmeticTranslator::new(skip, on_error) }
    }

    pub fn translate(&self, field: &[Ch]) -> Result<Translated<T>, ParseError> {
        let text = Ch::decode(field)?;
        let mut rewritten = String::with_capacity(text.len());
        for c in text.chars() {
            if Some(c) == self.thousands_separator {
                continue;
            } else if c == self.decimal_point {
                rewritten.push('.');
            } else {
                rewritten.push(c);
            }
        }
        match T::raw_convert(&rewritten) {
            Ok(v) => Ok(Translated::Value(v)),
            Err(e) => apply_conversion_error(&self.inner.on_error, e),
        }
    }

    pub fn skipped(&self) -> Result<Translated<T>, ParseError> {
        self.inner.skipped()
    }
}

impl<Ch, T> FieldTranslator<Ch> for LocaleArithmeticTranslator<Ch, T>
where
    Ch: CodeUnit + DecodeText,
    T: RawConvert,
{
    type Value = T;

    fn translate(&self, field: &[Ch]) -> Result<Translated<T>, ParseError> {
        LocaleArithmeticTranslator::translate(self, field)
    }

    fn skipped(&self) -> Result<Translated<T>, ParseError> {
        LocaleArithmeticTranslator::skipped(self)
    }
}

/// Constructs a new owned `String` from a field (spec.md §4.6 "own-string
/// translator").
pub struct OwnedStringTranslator<Ch> {
    skip: SkipHandling<String>,
    _ch: std::marker::PhantomData<Ch>,
}

impl<Ch: CodeUnit + DecodeText> OwnedStringTranslator<Ch> {
    pub fn new(skip: SkipHandling<String>) -> Self {
        Self { skip, _ch: std::marker::PhantomData }
    }

    pub fn translate(&self, field: &[Ch]) -> Result<Translated<String>, ParseError> {
        Ok(Translated::Value(Ch::decode(field)?.into_owned()))
    }

    pub fn skipped(&self) -> Result<Translated<String>, ParseError> {
        apply_skip(&self.skip)
    }
}

impl<Ch: CodeUnit + DecodeText> FieldTranslator<Ch> for OwnedStringTranslator<Ch> {
    type Value = String;

    fn translate(&self, field: &[Ch]) -> Result<Translated<String>, ParseError> {
        OwnedStringTranslator::translate(self, field)
    }

    fn skipped(&self) -> Result<Translated<String>, ParseError> {
        OwnedStringTranslator::skipped(self)
    }
}

/// Yields a non-owning view of a field's raw code units (spec.md §4.6
/// "view translator"). Skip handling has no substitute value since there is
/// nothing to borrow from; a skipped field can only fail or be ignored.
pub struct ViewTranslator<Ch> {
    fail_if_skipped: bool,
    _ch: std::marker::PhantomData<Ch>,
}

impl<Ch: CodeUnit> ViewTranslator<Ch> {
    pub fn new(fail_if_skipped: bool) -> Self {
        Self { fail_if_skipped, _ch: std::marker::PhantomData }
    }

    pub fn translate<'a>(&self, field: &'a [Ch]) -> Translated<&'a [Ch]> {
        Translated::Value(field)
    }

    pub fn skipped(&self) -> Result<Translated<&'static [Ch]>, ParseError> {
        if self.fail_if_skipped {
            Err(ParseError::FieldNotFound { name: None, position: TextPosition::ABSENT })
        } else {
            Ok(Translated::NoValue)
        }
    }
}
