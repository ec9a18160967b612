//! The CSV dialect engine: comma-delimited, double-quote-escaped.
//!
//! States and transitions are a direct port of the `after_comma`/`in_value`/
//! `right_of_open_quote`/`in_quoted_value`/`in_quoted_value_after_quote`/
//! `after_cr`/`after_lf` transition tables in
//! `original_source/include/commata/parse_csv.hpp`; the surrounding
//! refill/yield/EOF loop is the Rust reading of `detail/base_parser.hpp`'s
//! `invoke_impl`, factored through the shared [`crate::engine`] types.

use crate::buffer::BufferPolicy;
use crate::chars::{CodeUnit, CsvKeyChars, KeyChars};
use crate::engine::{self, PositionTracker, ResumePoint, RunResult, StepOutcome};
use crate::error::{ParseError, Sign, TextPosition};
use crate::handler::{Handler, Offset, YieldLocation};
use crate::input::CharInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AfterComma,
    InValue,
    RightOfOpenQuote,
    InQuotedValue,
    InQuotedValueAfterQuote,
    AfterCr,
    AfterLf,
}

/// Drives a [`Handler`] over comma-separated input.
///
/// `Ch` is the code unit (`u8` or `char`), `I` the character source, `H` the
/// handler, `B` the buffer policy (spec.md §4.2).
pub struct CsvEngine<Ch, I, H, B> {
    input: I,
    handler: H,
    buffer_policy: B,
    delim: Ch,
    quote: Ch,
    cr: Ch,
    lf: Ch,

    buffer: Option<Vec<Ch>>,
    buf_len: usize,
    p: usize,

    field_first: usize,
    field_last: usize,

    state: State,
    record_started: bool,
    eof_reached: bool,

    pos: PositionTracker,
    resume: ResumePoint,
}

impl<Ch, I, H, B> CsvEngine<Ch, I, H, B>
where
    Ch: CodeUnit,
    I: CharInput<Ch>,
    H: Handler<Ch>,
    B: BufferPolicy<Ch, H>,
{
    pub fn new(input: I, handler: H, buffer_policy: B, keys: CsvKeyChars) -> Self {
        Self {
            input,
            handler,
            buffer_policy,
            delim: keys.delimiter(),
            quote: keys.quote(),
            cr: keys.cr(),
            lf: keys.lf(),
            buffer: None,
            buf_len: 0,
            p: 0,
            field_first: 0,
            field_last: 0,
            state: State::AfterLf,
            record_started: false,
            eof_reached: false,
            pos: PositionTracker::new(),
            resume: ResumePoint::RefillBuffer,
        }
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Drives the parse until completion, abort, or a handler-requested
    /// suspension. Call again after `Suspended` to resume exactly where the
    /// last call left off.
    pub fn run(&mut self) -> Result<RunResult, ParseError> {
        loop {
            match self.resume {
                ResumePoint::AtEof => return Ok(RunResult::Completed),
                ResumePoint::AfterEndBuffer => {
                    self.release_current_buffer();
                    if self.eof_reached {
                        return self.finish_at_eof();
                    }
                    self.resume = ResumePoint::RefillBuffer;
                    continue;
                }
                ResumePoint::RefillBuffer => {
                    self.arrange_buffer().map_err(|e| self.attach_position(e))?;
                }
                ResumePoint::AfterStep => {
                    self.p += 1;
                }
            }

            if let Some(r) = self.run_char_loop().map_err(|e| self.attach_position(e))? {
                return Ok(r);
            }
            if let Some(r) = self.after_char_loop().map_err(|e| self.attach_position(e))? {
                return Ok(r);
            }
        }
    }

    fn attach_position(&mut self, error: ParseError) -> ParseError {
        let error = error.with_position(self.pos.position(self.p));
        self.handler.handle_exception(&error);
        error
    }

    fn arrange_buffer(&mut self) -> Result<(), ParseError> {
        let mut buf = self.buffer_policy.get_buffer(&mut self.handler)?;
        if buf.len() < 2 {
            return Err(ParseError::OutOfRange {
                sign: Sign::Zero,
                message: "buffer too small".to_string(),
                position: TextPosition::ABSENT,
            });
        }
        let capacity = buf.len();
        let mut loaded = 0usize;
        while loaded < capacity {
            let requested = capacity - loaded;
            let n = self.input.fill(&mut buf[loaded..])?;
            loaded += n;
            if n < requested {
                self.eof_reached = true;
                break;
            }
        }
        let full_end = buf.len();
        self.buffer = Some(buf);
        self.buf_len = loaded;
        self.p = 0;
        self.handler.start_buffer(0, full_end);
        self.pos.reset_for_new_buffer();
        self.set_first_last();
        Ok(())
    }

    fn release_current_buffer(&mut self) {
        self.pos.absorb_buffer(self.p);
        if let Some(buf) = self.buffer.take() {
            self.buffer_policy.release_buffer(&mut self.handler, buf);
        }
    }

    fn finish_at_eof(&mut self) -> Result<RunResult, ParseError> {
        if self.handler.should_yield(YieldLocation::End) {
            self.resume = ResumePoint::AtEof;
            return Ok(RunResult::Suspended);
        }
        self.resume = ResumePoint::AtEof;
        Ok(RunResult::Completed)
    }

    fn run_char_loop(&mut self) -> Result<Option<RunResult>, ParseError> {
        while self.p < self.buf_len {
            let outcome = self.step_normal()?;
            if outcome.is_abort() {
                return Ok(Some(RunResult::NotCompleted));
            }
            if self.handler.should_yield(YieldLocation::AfterStep) {
                self.resume = ResumePoint::AfterStep;
                return Ok(Some(RunResult::Suspended));
            }
            self.p += 1;
        }
        Ok(None)
    }

    fn after_char_loop(&mut self) -> Result<Option<RunResult>, ParseError> {
        let outcome = self.step_underflow()?;
        if outcome.is_abort() {
            return Ok(Some(RunResult::NotCompleted));
        }
        if self.eof_reached {
            self.set_first_last();
            let outcome = self.step_eof()?;
            if outcome.is_abort() {
                return Ok(Some(RunResult::NotCompleted));
            }
            if self.record_started {
                let outcome = self.emit_end_record()?;
                if outcome.is_abort() {
                    return Ok(Some(RunResult::NotCompleted));
                }
            }
        }
        let end = self.buf_len;
        self.handler.end_buffer(end);
        self.resume = ResumePoint::AfterEndBuffer;
        if self.handler.should_yield(YieldLocation::AfterEndBuffer) {
            return Ok(Some(RunResult::Suspended));
        }
        Ok(None)
    }

    // --- field/record bookkeeping -----------------------------------

    fn set_first_last(&mut self) {
        self.field_first = self.p;
        self.field_last = self.p;
    }

    fn update_last(&mut self) {
        self.field_last = self.p + 1;
    }

    fn cur(&self) -> Ch {
        self.buffer.as_ref().expect("buffer checked out while scanning")[self.p]
    }

    fn new_physical_line(&mut self) {
        self.pos.new_physical_line(self.p);
    }

    fn start_record_if_needed(&mut self, at: Offset) -> Result<StepOutcome, ParseError> {
        if !self.record_started {
            let ctrl = self.handler.start_record(at)?;
            self.record_started = true;
            return Ok(StepOutcome::from_control(ctrl));
        }
        Ok(StepOutcome::Continue)
    }

    fn emit_update(&mut self) -> Result<StepOutcome, ParseError> {
        let first = self.field_first;
        let last = self.field_last;
        let outcome = self.start_record_if_needed(first)?;
        if outcome.is_abort() {
            return Ok(outcome);
        }
        if first < last {
            let buf = self.buffer.as_ref().unwrap();
            let ctrl = self.handler.update(&buf[first..last])?;
            return Ok(StepOutcome::from_control(ctrl));
        }
        Ok(StepOutcome::Continue)
    }

    fn emit_finalize(&mut self) -> Result<StepOutcome, ParseError> {
        let first = self.field_first;
        let last = self.field_last;
        let outcome = self.start_record_if_needed(first)?;
        if outcome.is_abort() {
            return Ok(outcome);
        }
        let buf = self.buffer.as_ref().unwrap();
        let ctrl = self.handler.finalize(&buf[first..last])?;
        Ok(StepOutcome::from_control(ctrl))
    }

    fn emit_force_start_record(&mut self) -> Result<StepOutcome, ParseError> {
        let at = self.p;
        let ctrl = self.handler.start_record(at)?;
        self.record_started = true;
        Ok(StepOutcome::from_control(ctrl))
    }

    fn emit_end_record(&mut self) -> Result<StepOutcome, ParseError> {
        let at = self.p;
        let ctrl = self.handler.end_record(at)?;
        self.record_started = false;
        Ok(StepOutcome::from_control(ctrl))
    }

    fn emit_empty_physical_line(&mut self) -> Result<StepOutcome, ParseError> {
        let at = self.p;
        let ctrl = self.handler.empty_physical_line(at)?;
        Ok(StepOutcome::from_control(ctrl))
    }

    fn invalid_format(&self, message: &str) -> ParseError {
        ParseError::InvalidFormat {
            message: message.to_string(),
            position: TextPosition::ABSENT,
        }
    }

    // --- transition tables --------------------------------------------

    fn step_normal(&mut self) -> Result<StepOutcome, ParseError> {
        let c = self.cur();
        match self.state {
            State::AfterComma => {
                if c == self.delim {
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    self.state = State::AfterComma;
                    Ok(o)
                } else if c == self.quote {
                    self.state = State::RightOfOpenQuote;
                    Ok(StepOutcome::Continue)
                } else if c == self.cr {
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    let o = self.emit_end_record()?;
                    self.state = State::AfterCr;
                    Ok(o)
                } else if c == self.lf {
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    let o = self.emit_end_record()?;
                    self.state = State::AfterLf;
                    Ok(o)
                } else {
                    self.set_first_last();
                    self.update_last();
                    self.state = State::InValue;
                    Ok(StepOutcome::Continue)
                }
            }
            State::InValue => {
                if c == self.delim {
                    let o = self.emit_finalize()?;
                    self.state = State::AfterComma;
                    Ok(o)
                } else if c == self.quote {
                    Err(self.invalid_format("a quote found in a non-escaped value"))
                } else if c == self.cr {
                    let o = self.emit_finalize()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    let o = self.emit_end_record()?;
                    self.state = State::AfterCr;
                    Ok(o)
                } else if c == self.lf {
                    let o = self.emit_finalize()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    let o = self.emit_end_record()?;
                    self.state = State::AfterLf;
                    Ok(o)
                } else {
                    self.update_last();
                    Ok(StepOutcome::Continue)
                }
            }
            State::RightOfOpenQuote => {
                self.set_first_last();
                if c == self.quote {
                    self.state = State::InQuotedValueAfterQuote;
                } else {
                    self.update_last();
                    self.state = State::InQuotedValue;
                }
                Ok(StepOutcome::Continue)
            }
            State::InQuotedValue => {
                if c == self.quote {
                    let o = self.emit_update()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    self.set_first_last();
                    self.state = State::InQuotedValueAfterQuote;
                    Ok(StepOutcome::Continue)
                } else {
                    self.update_last();
                    Ok(StepOutcome::Continue)
                }
            }
            State::InQuotedValueAfterQuote => {
                if c == self.delim {
                    let o = self.emit_finalize()?;
                    self.state = State::AfterComma;
                    Ok(o)
                } else if c == self.quote {
                    self.set_first_last();
                    self.update_last();
                    self.state = State::InQuotedValue;
                    Ok(StepOutcome::Continue)
                } else if c == self.cr {
                    let o = self.emit_finalize()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    let o = self.emit_end_record()?;
                    self.state = State::AfterCr;
                    Ok(o)
                } else if c == self.lf {
                    let o = self.emit_finalize()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
                    let o = self.emit_end_record()?;
                    self.state = State::AfterLf;
                    Ok(o)
                } else {
                    Err(self.invalid_format("a character found after a closed escaped value"))
                }
            }
            State::AfterCr => {
                if c == self.delim {
                    self.new_physical_line();
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    self.state = State::AfterComma;
                    Ok(o)
                } else if c == self.quote {
                    self.new_physical_line();
                    let o = self.emit_force_start_record()?;
                    self.state = State::RightOfOpenQuote;
                    Ok(o)
                } else if c == self.cr {
                    self.new_physical_line();
                    let o = self.emit_empty_physical_line()?;
                    Ok(o)
                } else if c == self.lf {
                    self.state = State::AfterLf;
                    Ok(StepOutcome::Continue)
                } else {
                    self.new_physical_line();
                    self.set_first_last();
                    self.update_last();
                    self.state = State::InValue;
                    Ok(StepOutcome::Continue)
                }
            }
            State::AfterLf => {
                if c == self.delim {
                    self.new_physical_line();
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    self.state = State::AfterComma;
                    Ok(o)
                } else if c == self.quote {
                    self.new_physical_line();
                    let o = self.emit_force_start_record()?;
                    self.state = State::RightOfOpenQuote;
                    Ok(o)
                } else if c == self.cr {
                    self.new_physical_line();
                    let o = self.emit_empty_physical_line()?;
                    self.state = State::AfterCr;
                    Ok(o)
                } else if c == self.lf {
                    self.new_physical_line();
                    let o = self.emit_empty_physical_line()?;
                    Ok(o)
                } else {
                    self.new_physical_line();
                    self.set_first_last();
                    self.update_last();
                    self.state = State::InValue;
                    Ok(StepOutcome::Continue)
                }
            }
        }
    }

    fn step_underflow(&mut self) -> Result<StepOutcome, ParseError> {
        match self.state {
            State::InValue | State::InQuotedValue => self.emit_update(),
            _ => Ok(StepOutcome::Continue),
        }
    }

    fn step_eof(&mut self) -> Result<StepOutcome, ParseError> {
        match self.state {
            State::AfterComma | State::InValue | State::InQuotedValueAfterQuote => {
                self.emit_finalize()
            }
            State::RightOfOpenQuote | State::InQuotedValue => {
                Err(self.invalid_format("EOF reached inside an open escaped value"))
            }
            State::AfterCr | State::AfterLf => Ok(StepOutcome::Continue),
        }
    }
}

impl<Ch, I, H, B> engine::Engine<Ch, H> for CsvEngine<Ch, I, H, B>
where
    Ch: CodeUnit,
    I: CharInput<Ch>,
    H: Handler<Ch>,
    B: BufferPolicy<Ch, H>,
{
    fn run(&mut self) -> Result<RunResult, ParseError> {
        CsvEngine::run(self)
    }

    fn handler(&self) -> &H {
        CsvEngine::handler(self)
    }

    fn handler_mut(&mut self) -> &mut H {
        CsvEngine::handler_mut(self)
    }

    fn into_handler(self) -> H {
        CsvEngine::into_handler(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArenaPolicy;
    use crate::input::SliceInput;

    #[derive(Default)]
    struct RecordingHandler {
        fields: Vec<String>,
        records: Vec<usize>,
        current: String,
    }

    impl Handler<u8> for RecordingHandler {
        fn start_record(&mut self, _here: Offset) -> Result<crate::handler::Control, ParseError> {
            Ok(crate::handler::Control::Continue)
        }

        fn update(&mut self, slice: &[u8]) -> Result<crate::handler::Control, ParseError> {
            self.current.push_str(std::str::from_utf8(slice).unwrap());
            Ok(crate::handler::Control::Continue)
        }

        fn finalize(&mut self, slice: &[u8]) -> Result<crate::handler::Control, ParseError> {
            self.current.push_str(std::str::from_utf8(slice).unwrap());
            self.fields.push(std::mem::take(&mut self.current));
            Ok(crate::handler::Control::Continue)
        }

        fn end_record(&mut self, _here: Offset) -> Result<crate::handler::Control, ParseError> {
            self.records.push(self.fields.len());
            Ok(crate::handler::Control::Continue)
        }
    }

    fn parse(text: &str) -> RecordingHandler {
        let mut engine = CsvEngine::new(
            SliceInput::new(text.as_bytes()),
            RecordingHandler::default(),
            ArenaPolicy::<u8>::new(8),
            CsvKeyChars::default(),
        );
        let result = engine.run().expect("parse should succeed");
        assert_eq!(result, RunResult::Completed);
        engine.into_handler()
    }

    #[test]
    fn simple_two_records() {
        let h = parse("a,b,c\nd,e,f\n");
        assert_eq!(h.fields, vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(h.records, vec![3, 6]);
    }

    #[test]
    fn quoted_field_with_embedded_comma_and_escaped_quote() {
        let h = parse("\"x,y\",\"say \"\"hi\"\"\"\n");
        assert_eq!(h.fields, vec!["x,y", "say \"hi\""]);
    }

    #[test]
    fn trailing_record_without_newline() {
        let h = parse("1,2,3");
        assert_eq!(h.fields, vec!["1", "2", "3"]);
        assert_eq!(h.records, vec![3]);
    }

    #[test]
    fn lone_cr_terminates_a_record() {
        let h = parse("a,b\rc,d\r");
        assert_eq!(h.fields, vec!["a", "b", "c", "d"]);
        assert_eq!(h.records, vec![2, 4]);
    }

    #[test]
    fn empty_physical_lines_do_not_emit_fields() {
        let h = parse("a\n\n\nb\n");
        assert_eq!(h.fields, vec!["a", "b"]);
        assert_eq!(h.records, vec![1, 2]);
    }

    #[test]
    fn stray_quote_in_unescaped_value_is_invalid_format() {
        let mut engine = CsvEngine::new(
            SliceInput::new(b"a\"b\n"),
            RecordingHandler::default(),
            ArenaPolicy::<u8>::new(8),
            CsvKeyChars::default(),
        );
        let err = engine.run().unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat { .. }));
    }

    #[test]
    fn unterminated_quoted_value_at_eof_is_invalid_format() {
        let mut engine = CsvEngine::new(
            SliceInput::new(b"\"abc"),
            RecordingHandler::default(),
            ArenaPolicy::<u8>::new(8),
            CsvKeyChars::default(),
        );
        let err = engine.run().unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat { .. }));
    }

    #[test]
    fn field_spanning_a_buffer_boundary_reassembles() {
        // buffer size 4 forces several refills mid-field.
        let mut engine = CsvEngine::new(
            SliceInput::new(b"abcdefghij,2\n"),
            RecordingHandler::default(),
            ArenaPolicy::<u8>::new(4),
            CsvKeyChars::default(),
        );
        engine.run().unwrap();
        let h = engine.into_handler();
        assert_eq!(h.fields, vec!["abcdefghij", "2"]);
    }
}
