//! End-to-end use of the stored-table builders, table scanner, and record
//! extractor over the public API (spec.md §4.5, §4.7).

use fieldstream::buffer::ArenaPolicy;
use fieldstream::chars::CsvKeyChars;
use fieldstream::handler::Control;
use fieldstream::scanner::extractor::RecordExtractor;
use fieldstream::scanner::{ClosureFieldScanner, ColumnTable, HeaderScanner, TableScanner};
use fieldstream::stored::{StoredTable, StoredTableBuilder, TransposingBuilder};
use fieldstream::CsvEngine;

#[test]
fn stored_table_builder_produces_a_row_major_table() {
    let mut table: StoredTable<u8> = StoredTable::with_buffer_size(64);
    {
        let builder = StoredTableBuilder::new(&mut table);
        let mut engine =
            CsvEngine::new(fieldstream::input::SliceInput::new(b"name,age\nAlice,30\nBob,25\n"), builder, ArenaPolicy::<u8>::new(16), CsvKeyChars::default());
        engine.run().unwrap();
    }
    assert_eq!(table.content().len(), 3);
    assert_eq!(table.content()[2][0].len(), 3); // "Bob"
}

#[test]
fn transposing_builder_swaps_axes_for_a_column_oriented_view() {
    let mut table: StoredTable<u8> = StoredTable::with_buffer_size(64);
    {
        let builder = TransposingBuilder::new(&mut table);
        let mut engine =
            CsvEngine::new(fieldstream::input::SliceInput::new(b"a,b\n1,2\n3,4\n"), builder, ArenaPolicy::<u8>::new(16), CsvKeyChars::default());
        engine.run().unwrap();
    }
    // 2 rows (one per original column), 3 columns (one per original record)
    assert_eq!(table.content().len(), 2);
    assert_eq!(table.content()[0].len(), 3);
}

struct FirstRowHeader {
    target: &'static str,
}

impl HeaderScanner<u8> for FirstRowHeader {
    fn field(&mut self, index: usize, name: &[u8], columns: &mut ColumnTable<u8>) -> bool {
        if name == self.target.as_bytes() {
            columns.insert(
                index,
                Box::new(ClosureFieldScanner::<u8, _>::new(|_field: Vec<u8>| Control::Continue)),
            );
        }
        true
    }
}

#[test]
fn table_scanner_dispatches_only_registered_columns() {
    let scanner = TableScanner::<u8>::new().with_header(1, Box::new(FirstRowHeader { target: "age" }));
    let mut engine = CsvEngine::new(
        fieldstream::input::SliceInput::new(b"name,age\nAlice,30\nBob,25\n"),
        scanner,
        ArenaPolicy::<u8>::new(16),
        CsvKeyChars::default(),
    );
    let result = engine.run().unwrap();
    assert_eq!(result, fieldstream::RunResult::Completed);
}

#[test]
fn record_extractor_filters_by_column_value_end_to_end() {
    let out: Vec<u8> = Vec::new();
    let extractor = RecordExtractor::new(
        out,
        |name: &[u8]| name == b"status",
        |value: &[u8]| value == b"active",
        false,
        None,
    );
    let mut engine = CsvEngine::new(
        fieldstream::input::SliceInput::new(b"status,name\nactive,Alice\ninactive,Bob\nactive,Carol\n"),
        extractor,
        ArenaPolicy::<u8>::new(16),
        CsvKeyChars::default(),
    );
    engine.run().unwrap();
    let out = engine.into_handler().into_inner();
    assert_eq!(out, b"active,Alice\nactive,Carol\n");
}
