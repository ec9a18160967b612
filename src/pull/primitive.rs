//! The primitive pull adapter: a [`Handler`] that enqueues events instead
//! of invoking callbacks (spec.md §4.3).

use std::collections::VecDeque;

use crate::chars::CodeUnit;
use crate::engine::{Engine, RunResult};
use crate::error::ParseError;
use crate::handler::{Control, Handler, Offset, YieldLocation};

/// The event kind at the head of the primitive queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveState {
    BeforeParse,
    Eof,
    StartBuffer,
    EndBuffer,
    StartRecord,
    EndRecord,
    Update,
    Finalize,
    EmptyPhysicalLine,
}

/// One queued event together with whatever data it carries.
#[derive(Debug, Clone)]
pub enum PrimitiveEvent<Ch> {
    StartBuffer { begin: Offset, end: Offset },
    EndBuffer { end: Offset },
    StartRecord { here: Offset },
    EndRecord { here: Offset },
    Update { data: Vec<Ch> },
    Finalize { data: Vec<Ch> },
    EmptyPhysicalLine { here: Offset },
}

/// A value yielded by indexing into a queued event: either a bare buffer
/// offset, or a reference to the accumulated character data.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a, Ch> {
    Offset(Offset),
    Data(&'a [Ch]),
}

impl<Ch> PrimitiveEvent<Ch> {
    pub fn state(&self) -> PrimitiveState {
        match self {
            PrimitiveEvent::StartBuffer { .. } => PrimitiveState::StartBuffer,
            PrimitiveEvent::EndBuffer { .. } => PrimitiveState::EndBuffer,
            PrimitiveEvent::StartRecord { .. } => PrimitiveState::StartRecord,
            PrimitiveEvent::EndRecord { .. } => PrimitiveState::EndRecord,
            PrimitiveEvent::Update { .. } => PrimitiveState::Update,
            PrimitiveEvent::Finalize { .. } => PrimitiveState::Finalize,
            PrimitiveEvent::EmptyPhysicalLine { .. } => PrimitiveState::EmptyPhysicalLine,
        }
    }

    /// Number of addressable data items this event carries: 2 for
    /// `StartBuffer` (begin and end), 1 for everything else.
    pub fn data_size(&self) -> usize {
        match self {
            PrimitiveEvent::StartBuffer { .. } => 2,
            _ => 1,
        }
    }

    pub fn get(&self, index: usize) -> Option<FieldValue<'_, Ch>> {
        match (self, index) {
            (PrimitiveEvent::StartBuffer { begin, .. }, 0) => Some(FieldValue::Offset(*begin)),
            (PrimitiveEvent::StartBuffer { end, .. }, 1) => Some(FieldValue::Offset(*end)),
            (PrimitiveEvent::EndBuffer { end }, 0) => Some(FieldValue::Offset(*end)),
            (PrimitiveEvent::StartRecord { here }, 0) => Some(FieldValue::Offset(*here)),
            (PrimitiveEvent::EndRecord { here }, 0) => Some(FieldValue::Offset(*here)),
            (PrimitiveEvent::EmptyPhysicalLine { here }, 0) => Some(FieldValue::Offset(*here)),
            (PrimitiveEvent::Update { data }, 0) => Some(FieldValue::Data(data)),
            (PrimitiveEvent::Finalize { data }, 0) => Some(FieldValue::Data(data)),
            _ => None,
        }
    }
}

/// A construction-time bitmask selecting which event kinds get enqueued.
/// Masked-out events are dropped entirely rather than materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveMask(u16);

impl PrimitiveMask {
    pub const START_BUFFER: Self = Self(1 << 0);
    pub const END_BUFFER: Self = Self(1 << 1);
    pub const START_RECORD: Self = Self(1 << 2);
    pub const END_RECORD: Self = Self(1 << 3);
    pub const UPDATE: Self = Self(1 << 4);
    pub const FINALIZE: Self = Self(1 << 5);
    pub const EMPTY_PHYSICAL_LINE: Self = Self(1 << 6);
    pub const ALL: Self = Self(0x7f);

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    fn contains(self, state: PrimitiveState) -> bool {
        let bit = match state {
            PrimitiveState::StartBuffer => Self::START_BUFFER,
            PrimitiveState::EndBuffer => Self::END_BUFFER,
            PrimitiveState::StartRecord => Self::START_RECORD,
            PrimitiveState::EndRecord => Self::END_RECORD,
            PrimitiveState::Update => Self::UPDATE,
            PrimitiveState::Finalize => Self::FINALIZE,
            PrimitiveState::EmptyPhysicalLine => Self::EMPTY_PHYSICAL_LINE,
            PrimitiveState::BeforeParse | PrimitiveState::Eof => return true,
        };
        self.0 & bit.0 != 0
    }
}

impl std::ops::BitOr for PrimitiveMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// The [`Handler`] that turns engine callbacks into a pull queue.
pub struct PrimitiveHandler<Ch> {
    mask: PrimitiveMask,
    discard_data: bool,
    queue: VecDeque<PrimitiveEvent<Ch>>,
    yield_loc: YieldLocation,
}

impl<Ch: CodeUnit> PrimitiveHandler<Ch> {
    pub fn new(mask: PrimitiveMask) -> Self {
        Self { mask, discard_data: false, queue: VecDeque::new(), yield_loc: YieldLocation::AfterStep }
    }

    pub fn set_discard_data(&mut self, discard: bool) {
        self.discard_data = discard;
    }

    fn push(&mut self, state: PrimitiveState, event: impl FnOnce() -> PrimitiveEvent<Ch>) {
        if self.mask.contains(state) {
            self.queue.push_back(event());
        }
    }

    pub(crate) fn pop(&mut self) -> Option<PrimitiveEvent<Ch>> {
        self.queue.pop_front()
    }
}

impl<Ch: CodeUnit> Handler<Ch> for PrimitiveHandler<Ch> {
    fn start_record(&mut self, here: Offset) -> Result<Control, ParseError> {
        self.push(PrimitiveState::StartRecord, || PrimitiveEvent::StartRecord { here });
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        let discard = self.discard_data;
        self.push(PrimitiveState::Update, || {
            let data = if discard { Vec::new() } else { slice.to_vec() };
            PrimitiveEvent::Update { data }
        });
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        let discard = self.discard_data;
        self.push(PrimitiveState::Finalize, || {
            let data = if discard { Vec::new() } else { slice.to_vec() };
            PrimitiveEvent::Finalize { data }
        });
        Ok(Control::Continue)
    }

    fn end_record(&mut self, here: Offset) -> Result<Control, ParseError> {
        self.push(PrimitiveState::EndRecord, || PrimitiveEvent::EndRecord { here });
        Ok(Control::Continue)
    }

    fn start_buffer(&mut self, begin: Offset, end: Offset) {
        self.push(PrimitiveState::StartBuffer, || PrimitiveEvent::StartBuffer { begin, end });
    }

    fn end_buffer(&mut self, end: Offset) {
        self.push(PrimitiveState::EndBuffer, || PrimitiveEvent::EndBuffer { end });
    }

    fn empty_physical_line(&mut self, here: Offset) -> Result<Control, ParseError> {
        self.push(PrimitiveState::EmptyPhysicalLine, || PrimitiveEvent::EmptyPhysicalLine { here });
        Ok(Control::Continue)
    }

    fn should_yield(&mut self, location: YieldLocation) -> bool {
        self.yield_loc = location;
        !self.queue.is_empty()
    }

    fn yield_location(&self) -> YieldLocation {
        self.yield_loc
    }
}

/// Drives an [`Engine`] through its [`PrimitiveHandler`] queue one event at
/// a time, refilling from the engine only when the queue runs dry.
pub struct PrimitivePullParser<Ch, E> {
    engine: E,
    state: PrimitiveState,
    current: Option<PrimitiveEvent<Ch>>,
    eof: bool,
}

impl<Ch, E> PrimitivePullParser<Ch, E>
where
    Ch: CodeUnit,
    E: Engine<Ch, PrimitiveHandler<Ch>>,
{
    pub fn new(engine: E) -> Self {
        Self { engine, state: PrimitiveState::BeforeParse, current: None, eof: false }
    }

    pub fn state(&self) -> PrimitiveState {
        self.state
    }

    pub fn data_size(&self) -> usize {
        self.current.as_ref().map(PrimitiveEvent::data_size).unwrap_or(0)
    }

    pub fn get(&self, index: usize) -> Option<FieldValue<'_, Ch>> {
        self.current.as_ref().and_then(|e| e.get(index))
    }

    pub fn set_discard_data(&mut self, discard: bool) {
        self.engine.handler_mut().set_discard_data(discard);
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Advances to the next event, refilling the queue from the engine at
    /// most once per call. After true EOF, repeated calls keep yielding
    /// `PrimitiveState::Eof`.
    pub fn step(&mut self) -> Result<(), ParseError> {
        loop {
            if let Some(ev) = self.engine.handler_mut().pop() {
                self.state = ev.state();
                self.current = Some(ev);
                return Ok(());
            }
            if self.eof {
                self.state = PrimitiveState::Eof;
                self.current = None;
                return Ok(());
            }
            match self.engine.run()? {
                RunResult::Completed | RunResult::NotCompleted => self.eof = true,
                RunResult::Suspended => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArenaPolicy;
    use crate::chars::CsvKeyChars;
    use crate::csv::CsvEngine;
    use crate::input::SliceInput;

    #[test]
    fn drains_every_field_and_record_boundary() {
        let engine = CsvEngine::new(
            SliceInput::new(b"a,b\nc,d\n"),
            PrimitiveHandler::<u8>::new(PrimitiveMask::ALL),
            ArenaPolicy::<u8>::new(8),
            CsvKeyChars::default(),
        );
        let mut pull = PrimitivePullParser::new(engine);
        let mut finalized = Vec::new();
        let mut record_ends = 0;
        loop {
            pull.step().unwrap();
            match pull.state() {
                PrimitiveState::Finalize => {
                    if let Some(FieldValue::Data(d)) = pull.get(0) {
                        finalized.push(String::from_utf8(d.to_vec()).unwrap());
                    }
                }
                PrimitiveState::EndRecord => record_ends += 1,
                PrimitiveState::Eof => break,
                _ => {}
            }
        }
        assert_eq!(finalized, vec!["a", "b", "c", "d"]);
        assert_eq!(record_ends, 2);
    }

    #[test]
    fn masked_out_events_are_never_materialized() {
        let engine = CsvEngine::new(
            SliceInput::new(b"a,b\n"),
            PrimitiveHandler::<u8>::new(PrimitiveMask::FINALIZE),
            ArenaPolicy::<u8>::new(8),
            CsvKeyChars::default(),
        );
        let mut pull = PrimitivePullParser::new(engine);
        loop {
            pull.step().unwrap();
            assert!(matches!(pull.state(), PrimitiveState::Finalize | PrimitiveState::Eof));
            if pull.state() == PrimitiveState::Eof {
                break;
            }
        }
    }
}
