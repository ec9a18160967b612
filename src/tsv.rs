//! The TSV dialect engine: configurable single-character delimiter, no
//! quoting (spec.md §1 Non-goal (iv)).
//!
//! A structural twin of [`crate::csv::CsvEngine`] with the three
//! quote-handling states removed, mirroring how `original_source` keeps
//! `parse_tsv.hpp` as its own small header next to `parse_csv.hpp` rather
//! than deriving one from the other.

use crate::buffer::BufferPolicy;
use crate::chars::{CodeUnit, KeyChars, TsvKeyChars};
use crate::engine::{self, PositionTracker, ResumePoint, RunResult, StepOutcome};
use crate::error::{ParseError, Sign, TextPosition};
use crate::handler::{Handler, Offset, YieldLocation};
use crate::input::CharInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AfterDelim,
    InValue,
    AfterCr,
    AfterCrs,
    AfterLf,
}

/// Drives a [`Handler`] over delimiter-separated, unquoted input.
pub struct TsvEngine<Ch, I, H, B> {
    input: I,
    handler: H,
    buffer_policy: B,
    delim: Ch,
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

impl<Ch, I, H, B> TsvEngine<Ch, I, H, B>
where
    Ch: CodeUnit,
    I: CharInput<Ch>,
    H: Handler<Ch>,
    B: BufferPolicy<Ch, H>,
{
    pub fn new(input: I, handler: H, buffer_policy: B, keys: TsvKeyChars<Ch>) -> Self {
        Self {
            input,
            handler,
            buffer_policy,
            delim: keys.delimiter(),
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

    fn step_normal(&mut self) -> Result<StepOutcome, ParseError> {
        let c = self.cur();
        match self.state {
            State::AfterDelim => {
                if c == self.delim {
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    self.state = State::AfterDelim;
                    Ok(o)
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
                    self.state = State::AfterDelim;
                    Ok(o)
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
            State::AfterCr => {
                if c == self.delim {
                    self.new_physical_line();
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    self.state = State::AfterDelim;
                    Ok(o)
                } else if c == self.cr {
                    // A second consecutive CR: the first already closed its
                    // physical line above; this one only advances the line
                    // counter (no second empty-line event), per
                    // `after_cr`'s `cr_c` transition to `after_crs`.
                    self.new_physical_line();
                    self.state = State::AfterCrs;
                    Ok(StepOutcome::Continue)
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
            State::AfterCrs => {
                if c == self.delim {
                    self.new_physical_line();
                    self.set_first_last();
                    let o = self.emit_finalize()?;
                    self.state = State::AfterDelim;
                    Ok(o)
                } else if c == self.cr {
                    // Third and later CRs in the run: the line was already
                    // counted by the second CR's transition into this
                    // state, so a bare CR here is a pure no-op.
                    Ok(StepOutcome::Continue)
                } else if c == self.lf {
                    self.state = State::AfterLf;
                    Ok(StepOutcome::Continue)
                } else {
                    // The run of CRs ends here: the line the trailing CRs
                    // sat on is reported empty before the new value starts.
                    self.new_physical_line();
                    let o = self.emit_empty_physical_line()?;
                    if o.is_abort() {
                        return Ok(o);
                    }
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
                    self.state = State::AfterDelim;
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
            State::InValue => self.emit_update(),
            _ => Ok(StepOutcome::Continue),
        }
    }

    fn step_eof(&mut self) -> Result<StepOutcome, ParseError> {
        match self.state {
            State::AfterDelim | State::InValue => self.emit_finalize(),
            State::AfterCr | State::AfterCrs | State::AfterLf => Ok(StepOutcome::Continue),
        }
    }
}

impl<Ch, I, H, B> engine::Engine<Ch, H> for TsvEngine<Ch, I, H, B>
where
    Ch: CodeUnit,
    I: CharInput<Ch>,
    H: Handler<Ch>,
    B: BufferPolicy<Ch, H>,
{
    fn run(&mut self) -> Result<RunResult, ParseError> {
        TsvEngine::run(self)
    }

    fn handler(&self) -> &H {
        TsvEngine::handler(self)
    }

    fn handler_mut(&mut self) -> &mut H {
        TsvEngine::handler_mut(self)
    }

    fn into_handler(self) -> H {
        TsvEngine::into_handler(self)
    }
}
