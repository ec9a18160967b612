//! The stored table: an arena plus a record/field content container
//! (spec.md §3, §4.7).

use crate::buffer::DEFAULT_BUFFER_SIZE;
use crate::chars::CodeUnit;
use crate::stored::arena::{Arena, Security};
use crate::stored::value::StoredValue;

/// The record/field container a [`StoredTable`] is generic over (Design
/// Note (e)): one default `Vec<Vec<StoredValue>>` impl is provided;
/// callers needing a different sequential container (e.g. `VecDeque` of
/// rows for cheap front-eviction) implement this trait for it.
pub trait Content: Default {
    fn new_record(&mut self);
    fn push_value(&mut self, value: StoredValue);
    fn extend_from(&mut self, other: Self);
}

impl Content for Vec<Vec<StoredValue>> {
    fn new_record(&mut self) {
        self.push(Vec::new());
    }

    fn push_value(&mut self, value: StoredValue) {
        self.last_mut().expect("start_record fires before any field").push(value);
    }

    fn extend_from(&mut self, other: Self) {
        self.extend(other);
    }
}

/// An ordered sequence of records, each an ordered sequence of
/// [`StoredValue`]s, backed by an [`Arena`] that owns the field bytes.
pub struct StoredTable<Ch, C = Vec<Vec<StoredValue>>> {
    pub(crate) arena: Arena<Ch>,
    pub(crate) content: C,
    buffer_size: usize,
}

impl<Ch: CodeUnit, C: Content> Default for StoredTable<Ch, C> {
    fn default() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }
}

impl<Ch: CodeUnit, C: Content> StoredTable<Ch, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { arena: Arena::new(), content: C::default(), buffer_size: buffer_size.max(2) }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.content = C::default();
    }

    /// Copies a finalized field's bytes into the arena, preferring leftover
    /// space in an existing block before allocating a new one sized to
    /// comfortably hold it (spec.md §4.7 "Grown fields" sizing, applied
    /// here to the arena block rather than to an in-place engine buffer —
    /// see `DESIGN.md` for why this crate accumulates fields into owned
    /// scratch instead of reusing the engine's live buffer).
    pub(crate) fn store_field(&mut self, data: &[Ch]) -> StoredValue {
        if data.is_empty() {
            return StoredValue::EMPTY;
        }
        let needed = data.len() + 1;
        if let Some((block, start)) = self.arena.secure_any(needed) {
            let end = start + data.len();
            self.arena.block_mut(block)[start..end].copy_from_slice(data);
            self.arena.block_mut(block)[end] = Ch::NUL;
            return StoredValue::new(block, start, end);
        }
        let size = next_block_size(self.buffer_size, data.len());
        let mut buffer = self.arena.generate_buffer(size);
        buffer[..data.len()].copy_from_slice(data);
        buffer[data.len()] = Ch::NUL;
        let block = self.arena.add_block(buffer);
        self.arena.secure_current_upto(block, needed);
        StoredValue::new(block, 0, data.len())
    }

    /// Replaces a stored value's content. Shrinks in place when the new
    /// value is no longer than the old one; otherwise claims fresh arena
    /// space (spec.md §4.7 "Rewriting values").
    pub fn rewrite_value(&mut self, value: &mut StoredValue, new_value: &[Ch]) {
        if new_value.is_empty() {
            *value = StoredValue::EMPTY;
            return;
        }
        if new_value.len() <= value.len() {
            if let Some(block) = value.block() {
                let (start, _) = value.range();
                let end = start + new_value.len();
                self.arena.block_mut(block)[start..end].copy_from_slice(new_value);
                self.arena.block_mut(block)[end] = Ch::NUL;
                *value = StoredValue::new(block, start, end);
            }
            return;
        }
        *value = self.store_field(new_value);
    }

    /// Snapshots arena security, runs `f`, and rolls back every allocation
    /// `f` made if it returns `Err` (spec.md §4.7 "Guarded rewrite" — the
    /// Rust-idiomatic `Result`-based analogue of the original's
    /// exception-triggered rollback).
    pub fn guard_rewrite<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        let snapshot: Security = self.arena.security();
        match f(self) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.arena.set_security(&snapshot);
                Err(e)
            }
        }
    }

    /// Transfers `other`'s arena blocks and records into `self`
    /// (spec.md §4.7 "Append/merge"). This crate does not model distinct
    /// per-table allocators (see `DESIGN.md`), so the copy-on-allocator-
    /// mismatch path from the original never applies here.
    pub fn append(&mut self, other: StoredTable<Ch, C>) {
        self.arena.merge(other.arena);
        self.content.extend_from(other.content);
    }
}

impl<Ch: CodeUnit, C: Content> std::ops::AddAssign<StoredTable<Ch, C>> for StoredTable<Ch, C> {
    fn add_assign(&mut self, other: StoredTable<Ch, C>) {
        self.append(other);
    }
}

fn next_block_size(preferred: usize, occupied: usize) -> usize {
    let mut next = preferred.max(2);
    while occupied >= next / 2 {
        next *= 2;
    }
    next
}
