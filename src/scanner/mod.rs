//! The table scanner: a [`Handler`] that owns per-column field scanners
//! and an optional header scanner (spec.md §4.5).

pub mod extractor;

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};

use crate::chars::CodeUnit;
use crate::error::ParseError;
use crate::handler::{Control, Handler, Offset};
use crate::translate::{FieldTranslator, Translated};

/// A per-column handler installed on a [`TableScanner`]. Receives each
/// finalized field whose column index it is registered for, or a
/// `field_skipped` notice when the current record had no field at that
/// column. Returns `Err` when the field itself is malformed for this
/// scanner's purpose (e.g. a [`TranslatingFieldScanner`]'s conversion
/// failing under `FailIfConversionFailed`) — distinct from `Ok(Abort)`,
/// which stops the parse without it being an error (spec.md §7).
pub trait FieldScanner<Ch: CodeUnit> {
    fn field_value(&mut self, field: Vec<Ch>) -> Result<Control, ParseError>;

    /// Default: a missing field is tolerated silently.
    fn field_skipped(&mut self) -> Result<Control, ParseError> {
        Ok(Control::Continue)
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Wraps any `FnMut(Vec<Ch>) -> Control` as a [`FieldScanner`], for callers
/// that don't need type-erased introspection, typed conversion, or error
/// propagation of their own scanner type.
pub struct ClosureFieldScanner<Ch, F> {
    f: F,
    _ch: std::marker::PhantomData<Ch>,
}

impl<Ch: CodeUnit + 'static, F: FnMut(Vec<Ch>) -> Control + 'static> ClosureFieldScanner<Ch, F> {
    pub fn new(f: F) -> Self {
        Self { f, _ch: std::marker::PhantomData }
    }
}

impl<Ch: CodeUnit + 'static, F: FnMut(Vec<Ch>) -> Control + 'static> FieldScanner<Ch> for ClosureFieldScanner<Ch, F> {
    fn field_value(&mut self, field: Vec<Ch>) -> Result<Control, ParseError> {
        Ok((self.f)(field))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fuses a [`FieldTranslator`] with a sink closure into a [`FieldScanner`]
/// (spec.md §4.5/§4.6: the column registry and the typed translators are
/// one scanning layer). A missing field and a conversion failure both
/// reach the translator's own `skipped`/`translate`, so their configured
/// `SkipHandling`/`ConversionErrorHandling` apply exactly as they would
/// standalone; a `FailIfSkipped`/`FailIfConversionFailed` outcome
/// propagates as a genuine `Err` out of the table scanner's `Handler`
/// methods, not a silent `Abort`.
pub struct TranslatingFieldScanner<Ch, Tr, F> {
    translator: Tr,
    sink: F,
    _ch: std::marker::PhantomData<Ch>,
}

impl<Ch, Tr, F> TranslatingFieldScanner<Ch, Tr, F>
where
    Ch: CodeUnit + 'static,
    Tr: FieldTranslator<Ch> + 'static,
    F: FnMut(Tr::Value) -> Control + 'static,
{
    pub fn new(translator: Tr, sink: F) -> Self {
        Self { translator, sink, _ch: std::marker::PhantomData }
    }
}

impl<Ch, Tr, F> FieldScanner<Ch> for TranslatingFieldScanner<Ch, Tr, F>
where
    Ch: CodeUnit + 'static,
    Tr: FieldTranslator<Ch> + 'static,
    F: FnMut(Tr::Value) -> Control + 'static,
{
    fn field_value(&mut self, field: Vec<Ch>) -> Result<Control, ParseError> {
        match self.translator.translate(&field)? {
            Translated::Value(v) => Ok((self.sink)(v)),
            Translated::NoValue => Ok(Control::Continue),
        }
    }

    fn field_skipped(&mut self) -> Result<Control, ParseError> {
        match self.translator.skipped()? {
            Translated::Value(v) => Ok((self.sink)(v)),
            Translated::NoValue => Ok(Control::Continue),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The column-index-keyed registry a [`HeaderScanner`] is handed as its
/// back-reference, to install or remove field scanners while inspecting
/// header names.
pub type ColumnTable<Ch> = BTreeMap<usize, Box<dyn FieldScanner<Ch>>>;

/// Inspects header record fields and installs column scanners.
/// `field` returns `false` to retire: the header phase ends once the
/// record currently being read finishes.
pub trait HeaderScanner<Ch: CodeUnit> {
    fn field(&mut self, index: usize, name: &[Ch], columns: &mut ColumnTable<Ch>) -> bool;
}

/// Fires once per record, after any `field_skipped` sweep. Returning
/// `false` aborts the parse.
pub trait RecordEndScanner {
    fn record_end(&mut self) -> bool;
}

/// A [`Handler`] that dispatches finalized fields to per-column
/// [`FieldScanner`]s, optionally preceded by a header phase.
pub struct TableScanner<Ch: CodeUnit> {
    columns: ColumnTable<Ch>,
    header: Option<Box<dyn HeaderScanner<Ch>>>,
    header_records_total: usize,
    header_records_seen: usize,
    header_retiring: bool,
    record_end_scanner: Option<Box<dyn RecordEndScanner>>,
    field_index: usize,
    seen_this_record: BTreeSet<usize>,
    scratch: Vec<Ch>,
}

impl<Ch: CodeUnit> Default for TableScanner<Ch> {
    fn default() -> Self {
        Self {
            columns: BTreeMap::new(),
            header: None,
            header_records_total: 0,
            header_records_seen: 0,
            header_retiring: false,
            record_end_scanner: None,
            field_index: 0,
            seen_this_record: BTreeSet::new(),
            scratch: Vec::new(),
        }
    }
}

impl<Ch: CodeUnit> TableScanner<Ch> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes the first `k` physical records to `header` instead of the
    /// body scanners.
    pub fn with_header(mut self, k: usize, header: Box<dyn HeaderScanner<Ch>>) -> Self {
        self.header = Some(header);
        self.header_records_total = k;
        self
    }

    pub fn set_record_end_scanner(&mut self, scanner: Box<dyn RecordEndScanner>) {
        self.record_end_scanner = Some(scanner);
    }

    pub fn add_field_scanner(&mut self, column: usize, scanner: Box<dyn FieldScanner<Ch>>) {
        self.columns.insert(column, scanner);
    }

    pub fn remove_field_scanner(&mut self, column: usize) -> Option<Box<dyn FieldScanner<Ch>>> {
        self.columns.remove(&column)
    }

    /// Returns the concrete scanner at `column` if one is registered and
    /// its type matches `T` (spec.md §4.5 "type-erased introspection").
    pub fn get_field_scanner<T: 'static>(&self, column: usize) -> Option<&T> {
        self.columns.get(&column).and_then(|s| s.as_any().downcast_ref::<T>())
    }

    pub fn get_field_scanner_mut<T: 'static>(&mut self, column: usize) -> Option<&mut T> {
        self.columns.get_mut(&column).and_then(|s| s.as_any_mut().downcast_mut::<T>())
    }

    fn in_header_phase(&self) -> bool {
        self.header.is_some() && self.header_records_seen < self.header_records_total
    }
}

impl<Ch: CodeUnit> Handler<Ch> for TableScanner<Ch> {
    fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.field_index = 0;
        self.seen_this_record.clear();
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        self.scratch.extend_from_slice(slice);
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        self.scratch.extend_from_slice(slice);
        let data = std::mem::take(&mut self.scratch);
        let index = self.field_index;
        self.field_index += 1;

        if self.in_header_phase() {
            let header = self.header.as_mut().expect("checked by in_header_phase");
            if !header.field(index, &data, &mut self.columns) {
                self.header_retiring = true;
            }
            Ok(Control::Continue)
        } else {
            self.seen_this_record.insert(index);
            match self.columns.get_mut(&index) {
                Some(scanner) => scanner.field_value(data),
                None => Ok(Control::Continue),
            }
        }
    }

    fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        if self.in_header_phase() {
            self.header_records_seen += 1;
            if self.header_retiring {
                self.header_records_total = self.header_records_seen;
                self.header_retiring = false;
            }
            return Ok(Control::Continue);
        }

        let missing: Vec<usize> =
            self.columns.keys().copied().filter(|c| !self.seen_this_record.contains(c)).collect();
        for column in missing {
            if let Some(scanner) = self.columns.get_mut(&column) {
                if scanner.field_skipped()?.is_abort() {
                    return Ok(Control::Abort);
                }
            }
        }
        if let Some(scanner) = self.record_end_scanner.as_mut() {
            if !scanner.record_end() {
                return Ok(Control::Abort);
            }
        }
        Ok(Control::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArenaPolicy;
    use crate::chars::CsvKeyChars;
    use crate::csv::CsvEngine;
    use crate::input::SliceInput;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NameHeader {
        wanted: Vec<&'static str>,
        captured: Rc<RefCell<Vec<String>>>,
    }

    impl HeaderScanner<u8> for NameHeader {
        fn field(&mut self, _index: usize, name: &[u8], columns: &mut ColumnTable<u8>) -> bool {
            let name = std::str::from_utf8(name).unwrap();
            if let Some(pos) = self.wanted.iter().position(|w| *w == name) {
                let captured = self.captured.clone();
                columns.insert(
                    pos,
                    Box::new(ClosureFieldScanner::<u8, _>::new(move |field: Vec<u8>| {
                        captured.borrow_mut().push(String::from_utf8(field).unwrap());
                        Control::Continue
                    })),
                );
            }
            true
        }
    }

    #[test]
    fn header_then_body_dispatch() {
        let captured = Rc::new(RefCell::new(Vec::new()));
        let header = NameHeader { wanted: vec!["a", "b"], captured: captured.clone() };
        let scanner = TableScanner::<u8>::new().with_header(1, Box::new(header));
        let mut engine = CsvEngine::new(
            SliceInput::new(b"a,b\n1,2\n3,4\n"),
            scanner,
            ArenaPolicy::<u8>::new(16),
            CsvKeyChars::default(),
        );
        engine.run().unwrap();
        assert_eq!(*captured.borrow(), vec!["1", "3"]);
    }

    #[test]
    fn get_field_scanner_downcasts_by_type() {
        struct Counter(usize);
        impl FieldScanner<u8> for Counter {
            fn field_value(&mut self, _field: Vec<u8>) -> Result<Control, ParseError> {
                self.0 += 1;
                Ok(Control::Continue)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        let mut scanner = TableScanner::<u8>::new();
        scanner.add_field_scanner(0, Box::new(Counter(0)));
        assert!(scanner.get_field_scanner::<Counter>(0).is_some());
        assert_eq!(scanner.get_field_scanner::<Counter>(0).unwrap().0, 0);
        assert!(scanner.get_field_scanner::<u32>(0).is_none());
    }

    #[test]
    fn translating_field_scanner_dispatches_through_a_typed_translator() {
        use crate::translate::{ArithmeticTranslator, ConversionErrorHandling, SkipHandling};

        let totals = Rc::new(RefCell::new(0i64));
        let sink_totals = totals.clone();
        let translator: ArithmeticTranslator<u8, i64> =
            ArithmeticTranslator::new(SkipHandling::FailIfSkipped, ConversionErrorHandling::FailIfConversionFailed);
        let mut scanner = TableScanner::<u8>::new();
        scanner.add_field_scanner(
            0,
            Box::new(TranslatingFieldScanner::new(translator, move |v: i64| {
                *sink_totals.borrow_mut() += v;
                Control::Continue
            })),
        );
        let mut engine = CsvEngine::new(
            SliceInput::new(b"1\n2\n3\n"),
            scanner,
            ArenaPolicy::<u8>::new(16),
            CsvKeyChars::default(),
        );
        assert_eq!(engine.run().unwrap(), crate::engine::RunResult::Completed);
        assert_eq!(*totals.borrow(), 6);
    }

    #[test]
    fn translating_field_scanner_surfaces_conversion_failure_as_a_real_error() {
        use crate::translate::{ArithmeticTranslator, ConversionErrorHandling, SkipHandling};

        let translator: ArithmeticTranslator<u8, i64> =
            ArithmeticTranslator::new(SkipHandling::FailIfSkipped, ConversionErrorHandling::FailIfConversionFailed);
        let mut scanner = TableScanner::<u8>::new();
        scanner.add_field_scanner(0, Box::new(TranslatingFieldScanner::new(translator, |_: i64| Control::Continue)));
        let mut engine = CsvEngine::new(
            SliceInput::new(b"not-a-number\n"),
            scanner,
            ArenaPolicy::<u8>::new(16),
            CsvKeyChars::default(),
        );
        let err = engine.run().unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat { .. }));
    }
}
