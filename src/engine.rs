//! Shared engine infrastructure: physical position tracking and the
//! three-way outcome of `run()`.
//!
//! The state machines themselves live in [`crate::csv`] and [`crate::tsv`]
//! — one engine type per dialect, each a self-contained port of
//! `original_source`'s `parse_csv.hpp`/`parse_tsv.hpp` (which are likewise
//! two independent headers, not a shared template over the separator set).
//! What *is* shared, and lives here, is the position-tracking arithmetic
//! (spec.md §4.1) and the resumption/outcome vocabulary (Design Notes
//! (c)/(d)), since those are exactly the pieces spec.md §8 invariant 3 and
//! the yield contract hold both dialects to identically.

use crate::chars::CodeUnit;
use crate::error::{ParseError, TextPosition};
use crate::handler::{Handler, YieldLocation};

/// A dialect engine driven by a [`Handler`]. Lets the pull adapters in
/// [`crate::pull`] and the table scanner in [`crate::scanner`] stay generic
/// over [`crate::csv::CsvEngine`] and [`crate::tsv::TsvEngine`] instead of
/// being written out twice.
pub trait Engine<Ch: CodeUnit, H: Handler<Ch>> {
    fn run(&mut self) -> Result<RunResult, ParseError>;
    fn handler(&self) -> &H;
    fn handler_mut(&mut self) -> &mut H;
    fn into_handler(self) -> H;
}

/// Outcome of a call to `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// The parse ran to end of input.
    Completed,
    /// A handler callback returned `Control::Abort`; no error, just an
    /// early stop (spec.md §7: "Abort ... is not an error").
    NotCompleted,
    /// A handler's `should_yield` returned `true`; call `run()` again to
    /// resume exactly where this call left off.
    Suspended,
}

/// Where to resume execution on the next `run()` call, after a
/// `Suspended` result. Ports the original's goto-label resumption
/// (Design Note (d)) as an explicit enum driving a phase dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePoint {
    /// Start (or continue) a fresh buffer cycle.
    RefillBuffer,
    /// Resume right after a normal-character step, at the point the
    /// original would `goto yield_1` (i.e. the character has already been
    /// processed; only advancing the cursor remains).
    AfterStep,
    /// Resume right after `end_buffer`/yield location 2, at the point the
    /// original would `goto yield_2` (release the buffer and continue the
    /// refill loop, or stop if EOF was already reached).
    AfterEndBuffer,
    /// Resume at the tail end, after the EOF-time yield. Nothing left to
    /// do but report completion again.
    AtEof,
}

impl Default for ResumePoint {
    fn default() -> Self {
        ResumePoint::RefillBuffer
    }
}

impl ResumePoint {
    pub fn for_location(location: YieldLocation) -> Self {
        match location {
            YieldLocation::AfterStep => ResumePoint::AfterStep,
            YieldLocation::AfterEndBuffer => ResumePoint::AfterEndBuffer,
            YieldLocation::End => ResumePoint::AtEof,
        }
    }
}

/// What a single transition-table step decided should happen to the
/// in-flight parse, *besides* any error. Abort is deliberately not folded
/// into `ParseError`: spec.md §7 is explicit that it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Continue,
    Abort,
}

impl StepOutcome {
    pub(crate) fn from_control(control: crate::handler::Control) -> Self {
        match control {
            crate::handler::Control::Continue => StepOutcome::Continue,
            crate::handler::Control::Abort => StepOutcome::Abort,
        }
    }

    pub(crate) fn is_abort(&self) -> bool {
        matches!(self, StepOutcome::Abort)
    }
}

/// Tracks physical line/column across buffer refills, per spec.md §4.1:
///
/// > Column index = (current pointer − line-start-in-buffer) + accumulated.
/// > At buffer refill, the accumulated count absorbs the intra-buffer delta
/// > before the old pointers become invalid.
#[derive(Debug, Clone, Default)]
pub(crate) struct PositionTracker {
    physical_line_index: Option<usize>,
    line_start_offset: usize,
    chars_passed_away: usize,
}

impl PositionTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks `p` (an offset in the *current* buffer) as the start of a new
    /// physical line.
    pub(crate) fn new_physical_line(&mut self, p: usize) {
        self.physical_line_index = Some(self.physical_line_index.map_or(0, |i| i + 1));
        self.line_start_offset = p;
        self.chars_passed_away = 0;
    }

    /// Called when a fresh buffer is installed: the line-start offset
    /// resets to the new buffer's beginning (offset 0), but the
    /// accumulated column count from the previous buffer is preserved.
    pub(crate) fn reset_for_new_buffer(&mut self) {
        self.line_start_offset = 0;
    }

    /// Absorbs the intra-buffer delta up to `p` into the accumulated
    /// count, just before the buffer is released and its offsets become
    /// meaningless.
    pub(crate) fn absorb_buffer(&mut self, p: usize) {
        self.chars_passed_away += p - self.line_start_offset;
    }

    pub(crate) fn column_at(&self, p: usize) -> usize {
        (p - self.line_start_offset) + self.chars_passed_away
    }

    pub(crate) fn position(&self, p: usize) -> TextPosition {
        match self.physical_line_index {
            Some(line) => TextPosition::new(line, self.column_at(p)),
            None => TextPosition::ABSENT,
        }
    }
}
