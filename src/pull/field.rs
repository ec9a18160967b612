//! The field pull adapter: a field-granular iterator built on the
//! primitive adapter (spec.md §4.4).

use crate::chars::CodeUnit;
use crate::engine::Engine;
use crate::error::ParseError;

use super::primitive::{FieldValue, PrimitiveHandler, PrimitiveMask, PrimitivePullParser, PrimitiveState};

/// The field adapter's own state, coarser than the primitive's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    BeforeParse,
    Field,
    RecordEnd,
    Eof,
}

/// The mask the field adapter drives its underlying primitive adapter with
/// (spec.md §4.4): just enough events to reassemble fields and notice
/// record/line boundaries.
pub fn field_adapter_mask() -> PrimitiveMask {
    PrimitiveMask::END_BUFFER
        | PrimitiveMask::END_RECORD
        | PrimitiveMask::EMPTY_PHYSICAL_LINE
        | PrimitiveMask::UPDATE
        | PrimitiveMask::FINALIZE
}

/// A field-granular pull iterator.
///
/// Field bytes are always reassembled into an owned scratch buffer: a
/// genuinely zero-copy view into the engine's live buffer cannot be handed
/// across a `step()` boundary in safe Rust (the buffer is owned by the
/// engine's [`crate::buffer::BufferPolicy`], not by this adapter), so the
/// "addressable and mutable in place" branch from the original design
/// collapses to the owned-scratch branch here.
pub struct FieldPullParser<Ch, E> {
    inner: PrimitivePullParser<Ch, E>,
    state: FieldState,
    scratch: Vec<Ch>,
    empty_line_as_record_end: bool,
}

impl<Ch, E> FieldPullParser<Ch, E>
where
    Ch: CodeUnit,
    E: Engine<Ch, PrimitiveHandler<Ch>>,
{
    pub fn new(engine: E) -> Self {
        Self {
            inner: PrimitivePullParser::new(engine),
            state: FieldState::BeforeParse,
            scratch: Vec::new(),
            empty_line_as_record_end: false,
        }
    }

    /// Controls whether a bare/empty physical line is surfaced as an extra
    /// `RecordEnd` or silently skipped (spec.md §4.4).
    pub fn set_empty_physical_line_as_record_end(&mut self, flag: bool) {
        self.empty_line_as_record_end = flag;
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn field(&self) -> Option<&[Ch]> {
        match self.state {
            FieldState::Field => Some(&self.scratch),
            _ => None,
        }
    }

    pub fn into_engine(self) -> E {
        self.inner.into_engine()
    }

    /// Advances to the next field or record boundary.
    pub fn step(&mut self) -> Result<(), ParseError> {
        self.scratch.clear();
        loop {
            self.inner.step()?;
            match self.inner.state() {
                PrimitiveState::Update => {
                    if let Some(FieldValue::Data(d)) = self.inner.get(0) {
                        self.scratch.extend_from_slice(d);
                    }
                }
                PrimitiveState::Finalize => {
                    if let Some(FieldValue::Data(d)) = self.inner.get(0) {
                        self.scratch.extend_from_slice(d);
                    }
                    self.state = FieldState::Field;
                    return Ok(());
                }
                PrimitiveState::EndRecord => {
                    self.state = FieldState::RecordEnd;
                    return Ok(());
                }
                PrimitiveState::EmptyPhysicalLine => {
                    if self.empty_line_as_record_end {
                        self.state = FieldState::RecordEnd;
                        return Ok(());
                    }
                }
                PrimitiveState::Eof => {
                    self.state = FieldState::Eof;
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    /// Discards the current field and the next `n` records without
    /// materializing any of their field values.
    pub fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        self.inner.set_discard_data(true);
        let mut remaining = n;
        let result = loop {
            if let Err(e) = self.step() {
                break Err(e);
            }
            match self.state {
                FieldState::RecordEnd => {
                    if remaining == 0 {
                        break Ok(());
                    }
                    remaining -= 1;
                }
                FieldState::Eof => break Ok(()),
                _ => {}
            }
        };
        self.inner.set_discard_data(false);
        result
    }
}
