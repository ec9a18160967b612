//! End-to-end scenarios against the public `CsvEngine`/`CsvParser` surface,
//! grounded in spec.md §8's concrete end-to-end scenarios and boundary cases.

use fieldstream::buffer::ArenaPolicy;
use fieldstream::chars::CsvKeyChars;
use fieldstream::error::ParseError;
use fieldstream::handler::{Control, Handler, Offset};
use fieldstream::input::SliceInput;
use fieldstream::{CsvEngine, CsvParser, Engine, RunResult};

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    fields: Vec<String>,
    scratch: String,
}

impl Handler<u8> for Recorder {
    fn start_record(&mut self, here: Offset) -> Result<Control, ParseError> {
        self.events.push(format!("start_record@{here}"));
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
        self.scratch.push_str(std::str::from_utf8(slice).unwrap());
        self.events.push(format!("update({:?})", std::str::from_utf8(slice).unwrap()));
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[u8]) -> Result<Control, ParseError> {
        self.scratch.push_str(std::str::from_utf8(slice).unwrap());
        let field = std::mem::take(&mut self.scratch);
        self.events.push(format!("finalize({field:?})"));
        self.fields.push(field);
        Ok(Control::Continue)
    }

    fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.events.push("end_record".to_string());
        Ok(Control::Continue)
    }

    fn empty_physical_line(&mut self, here: Offset) -> Result<Control, ParseError> {
        self.events.push(format!("empty_physical_line@{here}"));
        Ok(Control::Continue)
    }
}

fn run(input: &[u8], buffer_size: usize) -> Recorder {
    let mut engine =
        CsvEngine::new(SliceInput::new(input), Recorder::default(), ArenaPolicy::<u8>::new(buffer_size), CsvKeyChars::default());
    let result = engine.run().unwrap();
    assert_eq!(result, RunResult::Completed);
    engine.into_handler()
}

#[test]
fn simple_csv_two_records() {
    let h = run(b"a,b,c\r\n1,2,3\n", 64);
    assert_eq!(h.fields, vec!["a", "b", "c", "1", "2", "3"]);
    assert!(h.events.contains(&"start_record@0".to_string()));
    assert_eq!(h.events.iter().filter(|e| e.as_str() == "end_record").count(), 2);
}

#[test]
fn escaped_quotes_unescape_to_a_single_quote() {
    let h = run(b"a,\"b\"\"c\",d\n", 64);
    assert_eq!(h.fields, vec!["a", "b\"c", "d"]);
}

#[test]
fn field_reassembles_across_a_small_buffer() {
    let h = run(b"abcdef,gh\n", 4);
    assert_eq!(h.fields, vec!["abcdef", "gh"]);
}

#[test]
fn empty_physical_line_fires_between_records() {
    let h = run(b"a\n\nb\n", 64);
    assert_eq!(h.fields, vec!["a", "b"]);
    assert_eq!(h.events.iter().filter(|e| e.starts_with("empty_physical_line")).count(), 1);
}

#[test]
fn trailing_record_without_newline_is_still_finalized() {
    let h = run(b"a,b,c", 64);
    assert_eq!(h.fields, vec!["a", "b", "c"]);
    assert_eq!(h.events.iter().filter(|e| e.as_str() == "end_record").count(), 1);
}

#[test]
fn empty_file_produces_no_records() {
    let h = run(b"", 64);
    assert!(h.fields.is_empty());
    assert!(!h.events.iter().any(|e| e.as_str() == "end_record"));
}

#[test]
fn file_of_only_empty_quoted_fields() {
    let h = run(b"\"\",\"\"\n", 64);
    assert_eq!(h.fields, vec!["", ""]);
}

#[test]
fn quoted_field_with_escapes_at_start_middle_and_end() {
    let h = run(b"\"\"\"a\"\"b\"\"\"\n", 64);
    assert_eq!(h.fields, vec!["\"a\"b\""]);
}

#[test]
fn lone_cr_at_end_of_stream_terminates_the_record() {
    let h = run(b"a,b\r", 64);
    assert_eq!(h.fields, vec!["a", "b"]);
    assert_eq!(h.events.iter().filter(|e| e.as_str() == "end_record").count(), 1);
}

#[test]
fn abort_from_a_handler_reports_not_completed() {
    struct StopAfterOne {
        records: usize,
    }
    impl Handler<u8> for StopAfterOne {
        fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
            self.records += 1;
            if self.records > 1 {
                Ok(Control::Abort)
            } else {
                Ok(Control::Continue)
            }
        }
        fn update(&mut self, _slice: &[u8]) -> Result<Control, ParseError> {
            Ok(Control::Continue)
        }
        fn finalize(&mut self, _slice: &[u8]) -> Result<Control, ParseError> {
            Ok(Control::Continue)
        }
        fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
            Ok(Control::Continue)
        }
    }

    let mut engine = CsvEngine::new(
        SliceInput::new(b"a\nb\nc\n"),
        StopAfterOne { records: 0 },
        ArenaPolicy::<u8>::new(64),
        CsvKeyChars::default(),
    );
    let result = engine.run().unwrap();
    assert_eq!(result, RunResult::NotCompleted);
}

#[test]
fn custom_quote_character_via_the_parser_builder() {
    struct CountingHandler {
        records: usize,
        fields: Vec<String>,
    }
    impl Handler<u8> for CountingHandler {
        fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
            self.records += 1;
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
        CsvParser::builder().quote(b'\'').from_slice(b"a,'b,c'\n", CountingHandler { records: 0, fields: Vec::new() });
    parser.run().unwrap();
    let handler = parser.into_handler();
    assert_eq!(handler.records, 1);
    assert_eq!(handler.fields, vec!["a", "b,c"]);
}
