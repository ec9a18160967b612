//! Handlers that build a [`StoredTable`] directly from parse events
//! (spec.md §4.7 "Builder").
//!
//! Ported from `stored_table_builder`'s `start_record`/`update`/
//! `finalize`/`end_record` quartet. The original tracks a field as a raw
//! pointer range directly into its own buffer, letting buffer growth
//! reuse that same memory as the eventual arena block. This crate's
//! `Handler` only ever hands a callback a borrowed, scope-bound slice
//! (spec.md §4.2), so both builders here accumulate a field into owned
//! scratch across `update`/`finalize` calls instead — the same
//! simplification already used by the table scanner and pull adapters.

use crate::chars::CodeUnit;
use crate::error::ParseError;
use crate::handler::{Control, Handler, Offset};
use crate::stored::table::{Content, StoredTable};
use crate::stored::value::StoredValue;

/// Builds a table in row-major order: physical record `j`, field `i`
/// becomes row `j`, column `i` — the ordinary, non-transposed arrangement.
pub struct StoredTableBuilder<'t, Ch, C = Vec<Vec<StoredValue>>> {
    table: &'t mut StoredTable<Ch, C>,
    scratch: Vec<Ch>,
}

impl<'t, Ch: CodeUnit, C: Content> StoredTableBuilder<'t, Ch, C> {
    pub fn new(table: &'t mut StoredTable<Ch, C>) -> Self {
        Self { table, scratch: Vec::new() }
    }
}

impl<'t, Ch: CodeUnit, C: Content> Handler<Ch> for StoredTableBuilder<'t, Ch, C> {
    fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.table.content.new_record();
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        self.scratch.extend_from_slice(slice);
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        self.scratch.extend_from_slice(slice);
        let field = std::mem::take(&mut self.scratch);
        let value = self.table.store_field(&field);
        self.table.content.push_value(value);
        Ok(Control::Continue)
    }

    fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        Ok(Control::Continue)
    }
}

/// Builds a table with the (record, column) axes swapped: field `i` of
/// physical record `j` is placed at column `j` of row `i`, with holes
/// padded to the prior width on demand (spec.md §4.7 "Transposing
/// builder"). Tied to the default `Vec<Vec<StoredValue>>` content, since
/// the hole-padding needs direct row indexing a generic `Content` doesn't
/// offer.
pub struct TransposingBuilder<'t, Ch> {
    table: &'t mut StoredTable<Ch, Vec<Vec<StoredValue>>>,
    scratch: Vec<Ch>,
    record_index: usize,
    field_index: usize,
}

impl<'t, Ch: CodeUnit> TransposingBuilder<'t, Ch> {
    pub fn new(table: &'t mut StoredTable<Ch, Vec<Vec<StoredValue>>>) -> Self {
        Self { table, scratch: Vec::new(), record_index: 0, field_index: 0 }
    }
}

impl<'t, Ch: CodeUnit> Handler<Ch> for TransposingBuilder<'t, Ch> {
    fn start_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.field_index = 0;
        Ok(Control::Continue)
    }

    fn update(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        self.scratch.extend_from_slice(slice);
        Ok(Control::Continue)
    }

    fn finalize(&mut self, slice: &[Ch]) -> Result<Control, ParseError> {
        self.scratch.extend_from_slice(slice);
        let field = std::mem::take(&mut self.scratch);
        let value = self.table.store_field(&field);

        let row = self.field_index;
        if row >= self.table.content.len() {
            self.table.content.resize_with(row + 1, Vec::new);
        }
        let target_row = &mut self.table.content[row];
        if target_row.len() < self.record_index {
            target_row.resize(self.record_index, StoredValue::EMPTY);
        }
        target_row.push(value);
        self.field_index += 1;
        Ok(Control::Continue)
    }

    fn end_record(&mut self, _here: Offset) -> Result<Control, ParseError> {
        self.record_index += 1;
        Ok(Control::Continue)
    }
}
