//! End-to-end scenarios for the TSV dialect: no quoting, configurable
//! single-character delimiter (spec.md §1 Non-goal (iv)).

use fieldstream::buffer::ArenaPolicy;
use fieldstream::chars::TsvKeyChars;
use fieldstream::error::ParseError;
use fieldstream::handler::{Control, Handler, Offset};
use fieldstream::input::SliceInput;
use fieldstream::{RunResult, TsvEngine, TsvParser};

#[derive(Default)]
struct Recorder {
    fields: Vec<String>,
    records: usize,
    empty_lines: usize,
    scratch: String,
}

impl Handler<u8> for Recorder {
    fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.records += 1;
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
        self.scratch.push_str(std::str::from_utf8(slice).unwrap());
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
        self.scratch.push_str(std::str::from_utf8(slice).unwrap());
        self.fields.push(std::mem::take(&mut self.scratch));
        Ok(Control::Continue)
    }

    fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        Ok(Control::Continue)
    }

    fn empty_physical_line(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.empty_lines += 1;
        Ok(Control::Continue)
    }
}

#[test]
fn default_tab_delimiter() {
    let mut engine =
        TsvEngine::new(SliceInput::new(b"a\tb\tc\n1\t2\t3\n"), Recorder::default(), ArenaPolicy::<u8>::new(64), TsvKeyChars::default());
    assert_eq!(engine.run().unwrap(), RunResult::Completed);
    let h = engine.into_handler();
    assert_eq!(h.fields, vec!["a", "b", "c", "1", "2", "3"]);
    assert_eq!(h.records, 2);
}

#[test]
fn quotes_are_ordinary_characters_in_tsv() {
    let mut engine = TsvEngine::new(
        SliceInput::new(b"\"a\"\tb\n"),
        Recorder::default(),
        ArenaPolicy::<u8>::new(64),
        TsvKeyChars::default(),
    );
    engine.run().unwrap();
    let h = engine.into_handler();
    assert_eq!(h.fields, vec!["\"a\"", "b"]);
}

#[test]
fn a_run_of_bare_crs_reports_one_empty_line_and_keeps_field_boundaries() {
    // "a" \r \r \r "b" \n: the first CR ends the "a" record; the second and
    // third are a bare-CR run that collapses into a single reported empty
    // physical line, surfaced only once the run breaks on "b".
    let mut engine = TsvEngine::new(
        SliceInput::new(b"a\r\r\rb\n"),
        Recorder::default(),
        ArenaPolicy::<u8>::new(64),
        TsvKeyChars::default(),
    );
    assert_eq!(engine.run().unwrap(), RunResult::Completed);
    let h = engine.into_handler();
    assert_eq!(h.fields, vec!["a", "b"]);
    assert_eq!(h.records, 2);
    assert_eq!(h.empty_lines, 1);
}

#[test]
fn custom_delimiter_via_the_parser_builder() {
    struct CountingHandler {
        fields: Vec<String>,
    }
    impl Handler<u8> for CountingHandler {
        fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
            Ok(Control::Continue)
        }
        fn update(&mut self, _slice: &[u8]) -> Result<Control, ParseError> {
            Ok(Control::Continue)
        }
        fn finalize(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
            self.fields.push(String::from_utf8_lossy(slice).into_owned());
            Ok(Control::Continue)
        }
        fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
            Ok(Control::Continue)
        }
    }

    let mut parser =
        TsvParser::builder().delimiter(b'|').from_slice(b"a|b|c\n", CountingHandler { fields: Vec::new() });
    parser.run().unwrap();
    assert_eq!(parser.into_handler().fields, vec!["a", "b", "c"]);
}
