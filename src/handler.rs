//! The event interface the engine drives, and the two cooperative
//! interruption signals layered over it.
//!
//! Ported from `original_source/include/commata/handler_decorator.hpp` and
//! `full_fledged_handler`: rather than a CRTP decorator chain completing a
//! partial handler to the engine's full interface, this crate follows
//! Design Note (a)'s preferred option — a single trait with every
//! operation, mandatory methods required and optional ones defaulted to
//! no-ops. The compiler monomorphizes; there is no vtable on this path.

use crate::chars::CodeUnit;
use crate::error::ParseError;

/// What the engine should do next, as reported by a callback's `bool`
/// return in spec.md's handler interface table (`false` aborts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Abort,
}

impl Control {
    pub fn from_bool(continue_: bool) -> Self {
        if continue_ {
            Control::Continue
        } else {
            Control::Abort
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Control::Abort)
    }
}

/// A suspension point the engine may ask the handler about. Corresponds to
/// spec.md §4.1's "location id"s 1, 2, and `END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldLocation {
    /// After a normal-character step.
    AfterStep,
    /// After `end_buffer`.
    AfterEndBuffer,
    /// At end of stream.
    End,
}

/// A 0-based position within the current buffer, or at a record/line
/// boundary. The engine passes plain offsets; translating to `(line,
/// column)` is the engine's job (spec.md §4.1 Position tracking), not the
/// handler's.
pub type Offset = usize;

/// The full event interface the parse engine drives. Mandatory methods
/// (`start_record`, `update`, `finalize`, `end_record`) must be given a
/// real implementation; every other method has a no-op default and need
/// only be overridden by handlers that care (spec.md §4.2).
pub trait Handler<Ch: CodeUnit> {
    /// Fires once per record, before any field event for that record.
    /// Returning `Ok(Control::Abort)` stops the parse with no error
    /// (spec.md §7); returning `Err` stops it and propagates that error
    /// from `run()` instead.
    fn start_record(&mut self, here: Offset) -> Result<Control, ParseError>;

    /// Fires zero or more times per field as it accumulates across buffer
    /// refills; `slice` is only the newly-accumulated range, not the whole
    /// field so far (spec.md §8 invariant 2: concatenation across all
    /// `update`/`finalize` calls for one field yields the logical value).
    fn update(&mut self, slice: &[Ch]) -> Result<Control, ParseError>;

    /// Fires exactly once per field, with the field's final range (which
    /// may be empty if the whole field arrived via `update`).
    fn finalize(&mut self, slice: &[Ch]) -> Result<Control, ParseError>;

    /// Fires exactly once per record, after its last field.
    fn end_record(&mut self, here: Offset) -> Result<Control, ParseError>;

    /// Fires once per buffer refill. Default: no-op.
    fn start_buffer(&mut self, _begin: Offset, _end: Offset) {}

    /// Fires once after the engine has consumed a buffer's usable content.
    /// Default: no-op.
    fn end_buffer(&mut self, _end: Offset) {}

    /// Fires once per physical line that contained no unit (a bare CR,
    /// bare LF, or CRLF with nothing else on the line). Default: no-op,
    /// continuing the parse.
    fn empty_physical_line(&mut self, _here: Offset) -> Result<Control, ParseError> {
        Ok(Control::Continue)
    }

    /// Called at each of the engine's three suspension points
    /// (spec.md §4.1 Abort and yield). Returning `true` suspends `run()`
    /// immediately with `RunResult::Suspended`. Default: never suspends.
    fn should_yield(&mut self, _location: YieldLocation) -> bool {
        false
    }

    /// Supplies the resume point for the next `run()` call after a
    /// suspension. Default: irrelevant, since the default `should_yield`
    /// never suspends.
    fn yield_location(&self) -> YieldLocation {
        YieldLocation::AfterStep
    }

    /// Called exactly once, before an error propagates out of `run()`, for
    /// side-effectful bookkeeping (flushing logs, etc). Default: no-op.
    fn handle_exception(&mut self, _error: &ParseError) {}
}

/// Lets a handler manage its own buffers instead of using the engine's
/// internal arena (spec.md §4.2 pass-through buffer policy). A handler
/// implements this when it wants buffers allocated from, and returned to,
/// its own pool — e.g. the stored-table builder in [`crate::stored`],
/// which folds a finalized field's buffer directly into its arena instead
/// of copying out of an engine-owned one.
pub trait BufferOwner<Ch: CodeUnit> {
    /// Supplies a fresh buffer of at least the handler's preferred size.
    /// Must be at least 2 units long (spec.md §3: one data unit plus one
    /// reserved terminator slot).
    fn get_buffer(&mut self) -> Result<Vec<Ch>, ParseError>;

    /// Returns a buffer previously handed out by `get_buffer`, after the
    /// engine has issued `end_buffer` for it.
    fn release_buffer(&mut self, buffer: Vec<Ch>);
}
