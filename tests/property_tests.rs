//! Property-based tests for spec.md §8 invariants 1, 2, and 7.

use proptest::prelude::*;

use fieldstream::buffer::ArenaPolicy;
use fieldstream::chars::CsvKeyChars;
use fieldstream::error::ParseError;
use fieldstream::handler::{Control, Handler, Offset};
use fieldstream::input::SliceInput;
use fieldstream::translate::{ArithmeticTranslator, ConversionErrorHandling, SkipHandling, Translated};
use fieldstream::{CsvEngine, RunResult};

#[derive(Default)]
struct FieldCollector {
    records: Vec<Vec<String>>,
    current: Vec<String>,
    scratch: String,
}

impl Handler<u8> for FieldCollector {
    fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.current = Vec::new();
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
        self.scratch.push_str(&String::from_utf8_lossy(slice));
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
        self.scratch.push_str(&String::from_utf8_lossy(slice));
        self.current.push(std::mem::take(&mut self.scratch));
        Ok(Control::Continue)
    }

    fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.records.push(std::mem::take(&mut self.current));
        Ok(Control::Continue)
    }
}

/// Quotes a field per RFC 4180 only when it contains a comma, quote, CR, or
/// LF — the minimal escaping spec.md §8 invariant 1 holds the round trip to.
fn csv_quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\r') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render(records: &[Vec<String>]) -> String {
    records
        .iter()
        .map(|r| r.iter().map(|f| csv_quote(f)).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

fn field_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,8}"
}

proptest! {
    /// Invariant 1: re-rendering the parsed fields with minimal RFC 4180
    /// quoting and re-parsing reproduces the same fields.
    #[test]
    fn round_trips_through_render_and_reparse(
        records in prop::collection::vec(prop::collection::vec(field_text(), 1..4), 1..5)
    ) {
        let rendered = render(&records);
        let mut engine = CsvEngine::new(
            SliceInput::new(rendered.as_bytes()),
            FieldCollector::default(),
            ArenaPolicy::<u8>::new(64),
            CsvKeyChars::default(),
        );
        let result = engine.run().unwrap();
        prop_assert_eq!(result, RunResult::Completed);
        prop_assert_eq!(engine.into_handler().records, records);
    }

    /// Invariant 2: whether a field arrives in one `finalize` or split
    /// across several `update`s, the reassembled value is identical —
    /// exercised by forcing tiny buffers so most fields straddle a refill.
    #[test]
    fn reassembled_field_is_independent_of_buffer_size(
        field in "[a-zA-Z0-9]{1,20}",
        buffer_size in 2usize..6,
    ) {
        let input = format!("{field}\n");
        let mut engine = CsvEngine::new(
            SliceInput::new(input.as_bytes()),
            FieldCollector::default(),
            ArenaPolicy::<u8>::new(buffer_size),
            CsvKeyChars::default(),
        );
        engine.run().unwrap();
        let handler = engine.into_handler();
        prop_assert_eq!(&handler.records[0][0], &field);
    }

    /// Invariant 7: parsing an integer's canonical decimal text yields it
    /// back exactly.
    #[test]
    fn integer_round_trips_through_canonical_text(v in any::<i32>()) {
        let translator: ArithmeticTranslator<u8, i32> =
            ArithmeticTranslator::new(SkipHandling::FailIfSkipped, ConversionErrorHandling::FailIfConversionFailed);
        let text = v.to_string();
        match translator.translate(text.as_bytes()).unwrap() {
            Translated::Value(parsed) => prop_assert_eq!(parsed, v),
            Translated::NoValue => prop_assert!(false, "expected a value"),
        }
    }

    /// Invariant 7, floating-point: reparsing `to_string(v)` returns a `v'`
    /// with `v' == v`, for finite `v` (matches Rust's canonical round-trip
    /// `Display`/`FromStr` guarantee for `f64`).
    #[test]
    fn float_round_trips_through_its_own_display(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let translator: ArithmeticTranslator<u8, f64> =
            ArithmeticTranslator::new(SkipHandling::FailIfSkipped, ConversionErrorHandling::FailIfConversionFailed);
        let text = v.to_string();
        match translator.translate(text.as_bytes()).unwrap() {
            Translated::Value(parsed) => prop_assert_eq!(parsed, v),
            Translated::NoValue => prop_assert!(false, "expected a value"),
        }
    }
}
