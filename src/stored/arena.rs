//! The block arena backing a [`super::table::StoredTable`].
//!
//! Ported from `original_source/include/commata/stored_table.hpp`'s
//! `table_store`/`store_buffer`: a list of fixed-size blocks, each with a
//! high-water mark past which the block is unsecured (free) space. Unlike
//! the original, blocks are addressed by index rather than raw pointer —
//! stored values reference `(block_index, start, end)` — since that is the
//! safe-Rust way to hand out stable, non-owning views into a growable list
//! of buffers.

use crate::chars::CodeUnit;

struct Block<Ch> {
    data: Vec<Ch>,
    secured: usize,
}

/// A snapshot of every block's high-water mark, for [`Arena::set_security`]
/// to roll back to.
#[derive(Debug, Clone, Default)]
pub struct Security(Vec<usize>);

/// An ordered list of buffer blocks plus a free list of cleared ones.
pub struct Arena<Ch> {
    blocks: Vec<Block<Ch>>,
    free: Vec<Block<Ch>>,
}

impl<Ch: CodeUnit> Default for Arena<Ch> {
    fn default() -> Self {
        Self { blocks: Vec::new(), free: Vec::new() }
    }
}

impl<Ch: CodeUnit> Arena<Ch> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly-filled block to the arena, taking ownership of it.
    /// Returns the index later callers use to address ranges within it.
    pub fn add_block(&mut self, data: Vec<Ch>) -> usize {
        let index = self.blocks.len();
        self.blocks.push(Block { data, secured: 0 });
        index
    }

    pub fn block_len(&self, index: usize) -> usize {
        self.blocks[index].data.len()
    }

    pub fn block_slice(&self, index: usize, start: usize, end: usize) -> &[Ch] {
        &self.blocks[index].data[start..end]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut [Ch] {
        &mut self.blocks[index].data
    }

    /// Advances `index`'s high-water mark to `secured_last` directly,
    /// bypassing `secure_any`'s search (used right after the block was
    /// just added, so it is trivially the most recent one).
    pub fn secure_current_upto(&mut self, index: usize, secured_last: usize) {
        self.blocks[index].secured = secured_last;
    }

    /// Scans blocks for one with at least `size` unsecured units, advances
    /// its high-water mark by `size`, and returns `(block_index, start)`.
    pub fn secure_any(&mut self, size: usize) -> Option<(usize, usize)> {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            let available = block.data.len() - block.secured;
            if available >= size {
                let start = block.secured;
                block.secured += size;
                return Some((index, start));
            }
        }
        None
    }

    /// Reuses the first free block of sufficient size, or allocates a fresh
    /// one. The returned buffer is not yet tracked by the arena; add it
    /// back with [`Arena::add_block`] once it is filled.
    pub fn generate_buffer(&mut self, min_size: usize) -> Vec<Ch> {
        if let Some(pos) = self.free.iter().position(|b| b.data.len() >= min_size) {
            return self.free.remove(pos).data;
        }
        vec![Ch::NUL; min_size]
    }

    /// Returns a buffer that turned out not to be needed (e.g. displaced
    /// during field growth) to the free list.
    pub fn consume_buffer(&mut self, data: Vec<Ch>) {
        self.free.push(Block { data, secured: 0 });
    }

    /// Clears every block's secured region and moves all blocks to the
    /// free list, for reuse by a subsequent build.
    pub fn clear(&mut self) {
        for mut block in self.blocks.drain(..) {
            block.secured = 0;
            self.free.push(block);
        }
    }

    pub fn security(&self) -> Security {
        Security(self.blocks.iter().map(|b| b.secured).collect())
    }

    /// Rolls every block's high-water mark back to `snapshot`, dropping any
    /// blocks added since to the free list.
    pub fn set_security(&mut self, snapshot: &Security) {
        while self.blocks.len() > snapshot.0.len() {
            let mut block = self.blocks.pop().expect("just checked len() > snapshot len()");
            block.secured = 0;
            self.free.push(block);
        }
        for (block, &hwm) in self.blocks.iter_mut().zip(snapshot.0.iter()) {
            block.secured = hwm;
        }
    }

    /// Transfers `other`'s blocks (both active and free) into this arena.
    pub fn merge(&mut self, other: Arena<Ch>) {
        self.blocks.extend(other.blocks);
        self.free.extend(other.free);
    }
}
